use postpick_core::item::Item;
use postpick_core::search;
use postpick_core::store::PersistError;
use tracing::{debug, info, warn};

use crate::startup::StartupOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    Unselected,
    Selected(Item),
}

impl SelectionState {
    pub fn item(&self) -> Option<&Item> {
        match self {
            Self::Unselected => None,
            Self::Selected(item) => Some(item),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker {
    query: String,
    candidates: Vec<Item>,
    cursor: usize,
}

impl Picker {
    fn open(items: &[Item]) -> Self {
        Self {
            query: String::new(),
            candidates: items.to_vec(),
            cursor: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn candidates(&self) -> &[Item] {
        &self.candidates
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn highlighted(&self) -> Option<&Item> {
        self.candidates.get(self.cursor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Loading,
    Ready,
    PickerOpen(Picker),
}

/// A pick whose save has been handed off but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub token: u64,
    pub item: Item,
}

/// Sole owner of the screen's state. Rendering reads it through accessors and
/// every mutation is one method call on the UI turn.
#[derive(Debug)]
pub struct SelectionController {
    state: ControllerState,
    items: Vec<Item>,
    selection: SelectionState,
    fetch_error: Option<String>,
    notice: Option<String>,
    active_token: Option<u64>,
    pending_save: Option<u64>,
    next_token: u64,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            state: ControllerState::Loading,
            items: Vec::new(),
            selection: SelectionState::Unselected,
            fetch_error: None,
            notice: None,
            active_token: None,
            pending_save: None,
            next_token: 1,
        }
    }

    fn issue_token(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token = self.next_token.saturating_add(1);
        token
    }

    pub fn begin_startup(&mut self) -> u64 {
        let token = self.issue_token();
        self.active_token = Some(token);
        self.state = ControllerState::Loading;
        token
    }

    /// Drops relevance of any in-flight startup so late completions are ignored.
    pub fn detach(&mut self) {
        self.active_token = None;
    }

    pub fn is_awaiting(&self, token: u64) -> bool {
        self.active_token == Some(token) && self.state == ControllerState::Loading
    }

    pub fn apply_startup(&mut self, token: u64, outcome: StartupOutcome) -> bool {
        if !self.is_awaiting(token) {
            debug!(token, "discarding stale startup result");
            return false;
        }

        let selection = match outcome.prior {
            Ok(Some(item)) => SelectionState::Selected(item),
            Ok(None) => SelectionState::Unselected,
            Err(error) => {
                warn!(%error, "failed to read saved selection");
                SelectionState::Unselected
            }
        };

        let (items, fetch_error) = match outcome.fetched {
            Ok(items) => (items, None),
            Err(error) => {
                warn!(%error, "failed to fetch posts");
                (Vec::new(), Some(error.to_string()))
            }
        };

        info!(
            posts = items.len(),
            restored = selection.item().is_some(),
            "startup complete"
        );

        self.items = items;
        self.selection = selection;
        self.fetch_error = fetch_error;
        self.active_token = None;
        self.state = ControllerState::Ready;
        true
    }

    /// Startup worker went away without reporting; continue with nothing.
    pub fn abandon_startup(&mut self, token: u64, reason: &str) -> bool {
        if !self.is_awaiting(token) {
            return false;
        }

        warn!(token, reason, "startup ended without a result");
        self.items = Vec::new();
        self.fetch_error = Some(reason.to_string());
        self.active_token = None;
        self.state = ControllerState::Ready;
        true
    }

    pub fn open_picker(&mut self) -> bool {
        if self.state != ControllerState::Ready {
            return false;
        }

        self.state = ControllerState::PickerOpen(Picker::open(&self.items));
        true
    }

    pub fn close_picker(&mut self) -> bool {
        if !matches!(self.state, ControllerState::PickerOpen(_)) {
            return false;
        }

        self.state = ControllerState::Ready;
        true
    }

    pub fn set_query(&mut self, query: &str) {
        let ControllerState::PickerOpen(picker) = &mut self.state else {
            return;
        };

        picker.query = query.to_string();
        picker.candidates = search::filter(&self.items, query);
        picker.cursor = 0;
    }

    pub fn move_up(&mut self) {
        if let ControllerState::PickerOpen(picker) = &mut self.state {
            picker.cursor = picker.cursor.saturating_sub(1);
        }
    }

    pub fn move_down(&mut self) {
        if let ControllerState::PickerOpen(picker) = &mut self.state
            && picker.cursor + 1 < picker.candidates.len()
        {
            picker.cursor += 1;
        }
    }

    /// Selects the highlighted candidate and closes the picker. The returned
    /// save runs elsewhere; its result comes back through `apply_save`.
    pub fn pick(&mut self) -> Option<PendingSave> {
        let ControllerState::PickerOpen(picker) = &self.state else {
            return None;
        };
        let item = picker.highlighted()?.clone();

        let token = self.issue_token();
        self.pending_save = Some(token);
        self.selection = SelectionState::Selected(item.clone());
        self.state = ControllerState::Ready;
        debug!(id = item.id, token, "selection picked");
        Some(PendingSave { token, item })
    }

    /// Only the latest pick's save result is applied; a failure keeps the
    /// selection and raises a notice.
    pub fn apply_save(
        &mut self,
        token: u64,
        item: &Item,
        result: Result<(), PersistError>,
    ) -> bool {
        if self.pending_save != Some(token) {
            debug!(token, "discarding stale save result");
            return false;
        }
        self.pending_save = None;

        match result {
            Ok(()) => debug!(id = item.id, "selection saved"),
            Err(error) => {
                warn!(id = item.id, %error, "failed to save selection");
                self.notice = Some(format!(
                    "Selected \"{}\" but it could not be saved.\n\n{error}",
                    item.title
                ));
            }
        }
        true
    }

    /// Save worker went away without reporting.
    pub fn abandon_save(&mut self, token: u64, reason: &str) -> bool {
        if self.pending_save != Some(token) {
            return false;
        }
        self.pending_save = None;

        warn!(token, reason, "save ended without a result");
        let title = self.selected_title().unwrap_or_default();
        self.notice = Some(format!(
            "Selected \"{title}\" but it could not be saved.\n\n{reason}"
        ));
        true
    }

    pub fn is_saving(&self) -> bool {
        self.pending_save.is_some()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ControllerState::Loading
    }

    pub fn picker(&self) -> Option<&Picker> {
        match &self.state {
            ControllerState::PickerOpen(picker) => Some(picker),
            _ => None,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selected_title(&self) -> Option<&str> {
        self.selection.item().map(|item| item.title.as_str())
    }

    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use postpick_core::item::Item;
    use postpick_core::source::FetchError;
    use postpick_core::store::PersistError;

    use super::{ControllerState, PendingSave, SelectionController, SelectionState};
    use crate::startup::StartupOutcome;

    fn item(id: i64, title: &str) -> Item {
        Item {
            id,
            title: title.to_string(),
            body: format!("body {id}"),
        }
    }

    fn sample() -> Vec<Item> {
        vec![item(1, "Hello World"), item(2, "Goodbye")]
    }

    fn write_denied() -> PersistError {
        PersistError::Write {
            path: PathBuf::from("/read-only/store.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    fn ready(items: Vec<Item>, prior: Option<Item>) -> SelectionController {
        let mut controller = SelectionController::new();
        let token = controller.begin_startup();
        assert!(controller.apply_startup(
            token,
            StartupOutcome {
                prior: Ok(prior),
                fetched: Ok(items),
            },
        ));
        controller
    }

    fn type_query(controller: &mut SelectionController, query: &str) {
        let mut typed = String::new();
        for character in query.chars() {
            typed.push(character);
            controller.set_query(&typed);
        }
    }

    #[test]
    fn starts_loading_and_unselected() {
        let controller = SelectionController::new();
        assert!(controller.is_loading());
        assert_eq!(controller.selection(), &SelectionState::Unselected);
        assert!(controller.items().is_empty());
    }

    #[test]
    fn empty_store_starts_ready_without_title() {
        let controller = ready(sample(), None);

        assert_eq!(controller.state(), &ControllerState::Ready);
        assert_eq!(controller.selected_title(), None);
        assert_eq!(controller.items().len(), 2);
    }

    #[test]
    fn prior_selection_is_restored_even_if_not_in_list() {
        let controller = ready(sample(), Some(item(42, "Saved earlier")));

        assert_eq!(controller.selected_title(), Some("Saved earlier"));
        assert_eq!(controller.items(), sample().as_slice());
    }

    #[test]
    fn failed_fetch_is_ready_with_empty_list() {
        let mut controller = SelectionController::new();
        let token = controller.begin_startup();

        let applied = controller.apply_startup(
            token,
            StartupOutcome {
                prior: Ok(Some(item(2, "Goodbye"))),
                fetched: Err(FetchError::Status {
                    endpoint: "http://localhost/posts".to_string(),
                    status: 500,
                }),
            },
        );

        assert!(applied);
        assert_eq!(controller.state(), &ControllerState::Ready);
        assert!(controller.items().is_empty());
        assert!(controller.fetch_error().expect("fetch error").contains("500"));
        assert_eq!(controller.selected_title(), Some("Goodbye"));
    }

    #[test]
    fn failed_lookup_degrades_to_unselected() {
        let mut controller = SelectionController::new();
        let token = controller.begin_startup();

        controller.apply_startup(
            token,
            StartupOutcome {
                prior: Err(PersistError::Read {
                    path: PathBuf::from("/tmp/store.json"),
                    source: std::io::Error::other("io"),
                }),
                fetched: Ok(sample()),
            },
        );

        assert_eq!(controller.selection(), &SelectionState::Unselected);
        assert_eq!(controller.items().len(), 2);
    }

    #[test]
    fn stale_or_detached_results_are_discarded() {
        let mut controller = SelectionController::new();
        let first = controller.begin_startup();
        let second = controller.begin_startup();

        let stale = controller.apply_startup(
            first,
            StartupOutcome {
                prior: Ok(None),
                fetched: Ok(sample()),
            },
        );
        assert!(!stale);
        assert!(controller.is_loading());

        controller.detach();
        let detached = controller.apply_startup(
            second,
            StartupOutcome {
                prior: Ok(None),
                fetched: Ok(sample()),
            },
        );
        assert!(!detached);
        assert!(controller.is_loading());
        assert!(controller.items().is_empty());
    }

    #[test]
    fn startup_result_applies_only_once() {
        let mut controller = ready(sample(), None);
        let token = controller.next_token - 1;

        let again = controller.apply_startup(
            token,
            StartupOutcome {
                prior: Ok(None),
                fetched: Ok(Vec::new()),
            },
        );

        assert!(!again);
        assert_eq!(controller.items().len(), 2);
    }

    #[test]
    fn abandoned_startup_unblocks_loading() {
        let mut controller = SelectionController::new();
        let token = controller.begin_startup();

        assert!(controller.abandon_startup(token, "startup worker ended unexpectedly"));
        assert_eq!(controller.state(), &ControllerState::Ready);
        assert!(controller.items().is_empty());
    }

    #[test]
    fn picker_cannot_open_while_loading() {
        let mut controller = SelectionController::new();
        controller.begin_startup();
        assert!(!controller.open_picker());
        assert!(controller.picker().is_none());
    }

    #[test]
    fn typing_filters_candidates_without_touching_items_or_selection() {
        let mut controller = ready(sample(), Some(item(2, "Goodbye")));
        assert!(controller.open_picker());

        type_query(&mut controller, "hello");

        let picker = controller.picker().expect("picker open");
        assert_eq!(picker.query(), "hello");
        assert_eq!(picker.candidates(), &[item(1, "Hello World")]);
        assert_eq!(controller.items().len(), 2);
        assert_eq!(controller.selected_title(), Some("Goodbye"));
    }

    #[test]
    fn cursor_returns_to_first_candidate_when_query_changes() {
        let mut controller = ready(
            vec![item(1, "Hello World"), item(2, "Goodbye"), item(3, "Good night")],
            None,
        );
        controller.open_picker();
        controller.move_down();
        controller.move_down();
        assert_eq!(controller.picker().expect("picker").cursor(), 2);

        controller.set_query("o");
        let picker = controller.picker().expect("picker");
        assert_eq!(picker.candidates().len(), 3);
        assert_eq!(picker.cursor(), 0);

        controller.move_down();
        controller.set_query("good");
        let picker = controller.picker().expect("picker");
        assert_eq!(picker.cursor(), 0);
        assert_eq!(picker.candidates()[0], item(2, "Goodbye"));

        controller.set_query("zzz");
        let picker = controller.picker().expect("picker");
        assert!(picker.candidates().is_empty());
        assert_eq!(picker.cursor(), 0);
    }

    #[test]
    fn query_resets_when_picker_reopens() {
        let mut controller = ready(sample(), None);
        controller.open_picker();
        type_query(&mut controller, "good");
        assert!(controller.close_picker());

        controller.open_picker();
        let picker = controller.picker().expect("picker");
        assert_eq!(picker.query(), "");
        assert_eq!(picker.candidates().len(), 2);
    }

    #[test]
    fn pick_selects_and_closes_before_save_confirms() {
        let mut controller = ready(sample(), None);
        controller.open_picker();
        controller.move_down();

        let pending = controller.pick().expect("pending save");

        assert_eq!(pending.item, item(2, "Goodbye"));
        assert_eq!(controller.state(), &ControllerState::Ready);
        assert_eq!(controller.selected_title(), Some("Goodbye"));
        assert!(controller.is_saving());

        assert!(controller.apply_save(pending.token, &pending.item, Ok(())));
        assert!(!controller.is_saving());
        assert!(controller.notice().is_none());
    }

    #[test]
    fn failed_save_keeps_selection_and_raises_notice() {
        let mut controller = ready(sample(), None);
        controller.open_picker();

        let PendingSave { token, item: picked } = controller.pick().expect("pending save");
        assert!(controller.apply_save(token, &picked, Err(write_denied())));

        assert_eq!(controller.selected_title(), Some("Hello World"));
        assert_eq!(controller.state(), &ControllerState::Ready);
        assert!(
            controller
                .notice()
                .expect("notice")
                .contains("could not be saved")
        );

        controller.dismiss_notice();
        assert!(controller.notice().is_none());
    }

    #[test]
    fn only_latest_save_result_applies() {
        let mut controller = ready(sample(), None);
        controller.open_picker();
        let first = controller.pick().expect("first pick");
        controller.open_picker();
        controller.move_down();
        let second = controller.pick().expect("second pick");

        assert!(!controller.apply_save(first.token, &first.item, Err(write_denied())));
        assert!(controller.notice().is_none());
        assert!(controller.is_saving());

        assert!(controller.apply_save(second.token, &second.item, Ok(())));
        assert_eq!(controller.selected_title(), Some("Goodbye"));
        assert!(!controller.is_saving());
    }

    #[test]
    fn abandoned_save_raises_notice_once() {
        let mut controller = ready(sample(), None);
        controller.open_picker();
        let pending = controller.pick().expect("pending save");

        assert!(controller.abandon_save(pending.token, "save worker ended unexpectedly"));
        assert!(controller.notice().expect("notice").contains("Hello World"));
        assert!(!controller.abandon_save(pending.token, "again"));
    }

    #[test]
    fn pick_with_no_candidates_is_noop() {
        let mut controller = ready(sample(), None);
        controller.open_picker();
        controller.set_query("nothing matches");

        assert!(controller.pick().is_none());
        assert!(controller.picker().is_some());
        assert!(!controller.is_saving());
    }

    #[test]
    fn close_picker_keeps_selection() {
        let mut controller = ready(sample(), Some(item(1, "Hello World")));
        controller.open_picker();
        controller.move_down();

        assert!(controller.close_picker());
        assert_eq!(controller.selected_title(), Some("Hello World"));
        assert!(!controller.close_picker());
    }
}
