use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyEvent};
use postpick_app::{
    App, ControllerState, SaveEvent, SaveLoader, SelectionController, StartupEvent, StartupLoader,
};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Clear, Paragraph};
use tui_input::Input;
use tracing::warn;
use tui_input::backend::crossterm::EventHandler;

use crate::UiExit;
use crate::centered_rect;
use crate::keymap;
use crate::theme;
use crate::ui::loading::{LoadingState, render_loading_modal};
use crate::ui::modal::{render_error_modal, render_notice_modal};
use crate::ui::post_list::{render_posts, render_query};
use crate::ui::text::{
    compact_hint, focus_line, key_hint_height, key_hint_paragraph, wrapped_paragraph,
};

const WORKER_GONE: &str = "startup worker ended unexpectedly";
const SAVER_GONE: &str = "save worker ended unexpectedly";

pub(crate) struct SelectionScreen {
    controller: SelectionController,
    saver: Arc<dyn SaveLoader>,
    receiver: Option<Receiver<StartupEvent>>,
    saves: Vec<(u64, Receiver<SaveEvent>)>,
    token: u64,
    loading: LoadingState,
    query: Input,
    fetch_error_seen: bool,
}

impl SelectionScreen {
    pub(crate) fn new(app: &App) -> Self {
        Self::new_with_loaders(Arc::new(app.startup_loader()), Arc::new(app.save_loader()))
    }

    pub(crate) fn new_with_loaders(
        loader: Arc<dyn StartupLoader>,
        saver: Arc<dyn SaveLoader>,
    ) -> Self {
        let mut controller = SelectionController::new();
        let token = controller.begin_startup();
        let receiver = loader.spawn_startup(token);

        Self {
            controller,
            saver,
            receiver: Some(receiver),
            saves: Vec::new(),
            token,
            loading: LoadingState::default(),
            query: Input::default(),
            fetch_error_seen: false,
        }
    }

    pub(crate) fn on_tick(&mut self) {
        if self.controller.is_loading() {
            self.loading.next_frame();
        }
        self.drain_startup();
        self.drain_saves();
    }

    pub(crate) fn should_drain_after_input(&self) -> bool {
        self.receiver.is_some() || !self.saves.is_empty()
    }

    fn drain_startup(&mut self) {
        let Some(receiver) = self.receiver.as_ref() else {
            return;
        };

        match receiver.try_recv() {
            Ok(StartupEvent::Done { token, outcome }) => {
                self.controller.apply_startup(token, outcome);
                self.receiver = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.controller.abandon_startup(self.token, WORKER_GONE);
                self.receiver = None;
            }
        }
    }

    fn drain_saves(&mut self) {
        let controller = &mut self.controller;
        self.saves.retain(|(token, receiver)| match receiver.try_recv() {
            Ok(SaveEvent::Done {
                token,
                item,
                result,
            }) => {
                controller.apply_save(token, &item, result);
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                controller.abandon_save(*token, SAVER_GONE);
                false
            }
        });
    }

    /// Blocks until every outstanding save reports back or `timeout` passes.
    /// Called once the UI loop has ended so a pick made right before exit
    /// still reaches the store.
    pub(crate) fn flush_saves(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        for (token, receiver) in self.saves.drain(..) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match receiver.recv_timeout(remaining) {
                Ok(SaveEvent::Done {
                    token,
                    item,
                    result,
                }) => {
                    self.controller.apply_save(token, &item, result);
                }
                Err(RecvTimeoutError::Timeout) => warn!(token, "save still running at exit"),
                Err(RecvTimeoutError::Disconnected) => {
                    self.controller.abandon_save(token, SAVER_GONE);
                }
            }
        }
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Option<UiExit> {
        if self.fetch_error_pending() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                self.fetch_error_seen = true;
            }
            return None;
        }

        if self.controller.notice().is_some() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                self.controller.dismiss_notice();
            }
            return None;
        }

        if self.controller.is_loading() {
            if keymap::is_back(key) || keymap::is_quit(key) {
                self.controller.detach();
                self.receiver = None;
                return Some(UiExit::Completed);
            }
            return None;
        }

        if self.controller.picker().is_some() {
            self.on_picker_key(key);
            return None;
        }

        if keymap::is_back(key) || keymap::is_quit(key) {
            return Some(UiExit::Completed);
        }
        if keymap::is_open_picker(key) && self.controller.open_picker() {
            self.query = Input::default();
        }
        None
    }

    fn on_picker_key(&mut self, key: KeyEvent) {
        if keymap::is_back(key) {
            self.controller.close_picker();
            return;
        }

        if keymap::is_confirm(key) {
            if let Some(pending) = self.controller.pick() {
                let receiver = self.saver.spawn_save(pending.token, pending.item);
                self.saves.push((pending.token, receiver));
            }
            return;
        }

        if keymap::is_up(key) {
            self.controller.move_up();
            return;
        }

        if keymap::is_down(key) {
            self.controller.move_down();
            return;
        }

        if self.query.handle_event(&Event::Key(key)).is_some() {
            self.controller.set_query(self.query.value());
        }
    }

    fn fetch_error_pending(&self) -> bool {
        !self.fetch_error_seen
            && !self.controller.is_loading()
            && self.controller.fetch_error().is_some()
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        self.render_main(frame);

        match self.controller.state() {
            ControllerState::Loading => render_loading_modal(
                frame,
                "Loading",
                "Fetching posts and saved selection...",
                "Esc/q: quit",
                &self.loading,
            ),
            ControllerState::PickerOpen(_) => self.render_picker(frame),
            ControllerState::Ready => {}
        }

        if self.fetch_error_pending()
            && let Some(error) = self.controller.fetch_error()
        {
            let message = format!("Could not load posts.\n\n{error}");
            render_error_modal(frame, &message, "Enter/Esc: continue");
        } else if let Some(notice) = self.controller.notice() {
            render_notice_modal(frame, "Selection not saved", notice, "Enter/Esc: continue");
        }
    }

    fn render_main(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "Enter/o: set posts    Esc/q: quit    Ctrl-C: exit",
            "Enter/o: set posts    Esc/q: quit",
            "Enter: set | q: quit",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let [header, selected, status, _, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        let header_text = Text::from(vec![
            Line::from("postpick"),
            focus_line("Set posts to choose one"),
        ]);
        frame.render_widget(
            wrapped_paragraph(header_text).block(theme::chrome("Home")),
            header,
        );

        let value = match self.controller.selected_title() {
            Some(title) => Span::styled(title.to_string(), theme::selected_value()),
            None => Span::styled("No post selected", theme::secondary_text()),
        };
        frame.render_widget(
            Paragraph::new(Line::from(value)).block(theme::field("Selected post")),
            selected,
        );

        frame.render_widget(
            Paragraph::new(self.status_line()).block(theme::chrome("Posts")),
            status,
        );

        frame.render_widget(
            key_hint_paragraph(key_text).block(theme::key_block()),
            footer,
        );
    }

    fn status_line(&self) -> Line<'static> {
        if self.controller.is_loading() {
            return Line::from(Span::styled("Loading posts...", theme::secondary_text()));
        }

        if let Some(error) = self.controller.fetch_error() {
            return Line::from(Span::styled(
                format!("Could not load posts: {error}"),
                theme::error_prompt(),
            ));
        }

        let count = match self.controller.items().len() {
            1 => "1 post available".to_string(),
            count => format!("{count} posts available"),
        };
        if self.controller.is_saving() {
            return Line::from(vec![
                Span::raw(count),
                Span::styled("    Saving selection...", theme::secondary_text()),
            ]);
        }
        Line::from(count)
    }

    fn render_picker(&self, frame: &mut Frame<'_>) {
        let Some(picker) = self.controller.picker() else {
            return;
        };

        let area = centered_rect(84, 84, frame.area());
        frame.render_widget(Clear, area);
        let block = theme::chrome(focus_line("Posts List"));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let key_text = compact_hint(
            inner.width,
            "Type: search    Up/Down: move    Enter: pick    Esc: close",
            "Up/Down: move    Enter: pick    Esc: close",
            "Enter: pick | Esc: close",
        );
        let footer_height = key_hint_height(inner.width, key_text);
        let [query, list, footer] = picker_layout(inner, footer_height);

        render_query(frame, query, &self.query, Line::from("Search Posts"));
        let title = format!(
            "{} of {}",
            picker.candidates().len(),
            self.controller.items().len()
        );
        render_posts(frame, list, picker, Line::from(title));
        frame.render_widget(
            key_hint_paragraph(key_text).block(theme::key_block()),
            footer,
        );
    }
}

fn picker_layout(area: Rect, footer_height: u16) -> [Rect; 3] {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(footer_height),
        ])
        .areas(area)
}
