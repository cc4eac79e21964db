use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::AppState;

pub struct HeaderWidget;

impl HeaderWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let spinner = if state.is_loading {
            state.get_spinner_char().to_string()
        } else {
            " ".to_string()
        };

        let plan = state
            .report
            .as_ref()
            .and_then(|report| report.view().plan())
            .unwrap_or("Unknown Plan");

        let last_updated = state
            .report
            .as_ref()
            .and_then(|report| report.last_updated())
            .map(|updated| {
                updated
                    .with_timezone(&chrono::Local)
                    .format("%b %-d, %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| "never".to_string());

        let header_text = vec![Line::from(vec![
            Span::styled(
                format!("Cursor Usage Tracker - {}", plan),
                Style::default()
                    .fg(if state.data_loaded() {
                        Color::Cyan
                    } else {
                        Color::Red
                    })
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  (updated {})", last_updated),
                Style::default().fg(Color::Gray),
            ),
            Span::raw(" "),
            Span::styled(spinner, Style::default().fg(Color::Yellow)),
        ])];

        let header = Paragraph::new(header_text)
            .block(Block::bordered().title("Status"))
            .alignment(Alignment::Center);

        frame.render_widget(header, area);
    }
}
