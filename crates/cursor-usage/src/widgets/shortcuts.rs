use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::AppState;

pub struct ShortcutsWidget;

impl ShortcutsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let key = |k: &'static str| {
            Span::styled(
                k,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        };
        let text = |t: &'static str| Span::styled(t, Style::default().fg(Color::Gray));

        let mut spans = vec![
            text("Press "),
            key("q"),
            text(" to quit, "),
            key("r"),
            text(" to refresh, "),
            key("p/3/6/9/a"),
            text(" for range, "),
            key("e"),
            text(" for activity"),
        ];

        if let Some(status) = &state.status_message {
            spans.push(Span::styled(
                format!("  |  {}", status),
                Style::default().fg(Color::Cyan),
            ));
        }

        let shortcuts = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);

        frame.render_widget(shortcuts, area);
    }
}
