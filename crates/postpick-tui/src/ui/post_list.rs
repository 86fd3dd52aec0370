use postpick_app::Picker;
use postpick_core::item::Item;
use ratatui::Frame;
use ratatui::layout::{Margin, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use tui_input::Input;

use crate::theme;
use crate::ui::text::first_line;

pub(crate) const EMPTY_MESSAGE: &str = "No posts found";

pub(crate) fn render_query(frame: &mut Frame<'_>, area: Rect, input: &Input, title: Line<'_>) {
    let width = area.width.saturating_sub(2) as usize;
    let scroll = input.visual_scroll(width);
    let paragraph = Paragraph::new(input.value())
        .scroll((0, scroll as u16))
        .block(theme::field(title));
    frame.render_widget(paragraph, area);

    if width == 0 {
        return;
    }

    let visual = input.visual_cursor();
    let relative = visual.saturating_sub(scroll).min(width.saturating_sub(1));
    frame.set_cursor_position((area.x + 1 + relative as u16, area.y + 1));
}

pub(crate) fn render_posts(frame: &mut Frame<'_>, area: Rect, picker: &Picker, title: Line<'_>) {
    let candidates = picker.candidates();
    if candidates.is_empty() {
        let empty = Paragraph::new(Span::styled(EMPTY_MESSAGE, theme::secondary_text()))
            .block(theme::chrome(title));
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<ListItem<'_>> = candidates.iter().map(post_row).collect();
    let list = List::new(rows)
        .block(theme::chrome(title))
        .highlight_style(theme::list_highlight())
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    state.select(Some(picker.cursor()));
    frame.render_stateful_widget(list, area, &mut state);

    // Each row spans two lines.
    let viewport = (area.height.saturating_sub(2) / 2) as usize;
    let mut scrollbar_state = ScrollbarState::new(candidates.len())
        .position(picker.cursor())
        .viewport_content_length(viewport);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None),
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

fn post_row(item: &Item) -> ListItem<'_> {
    ListItem::new(Text::from(vec![
        Line::from(Span::styled(item.title.as_str(), theme::post_title())),
        Line::from(Span::styled(first_line(&item.body), theme::secondary_text())),
    ]))
}
