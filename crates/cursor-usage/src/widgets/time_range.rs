use cursor_usage_monitor::TimeRange;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::AppState;

const CHOICES: [(char, TimeRange, &str); 5] = [
    ('p', TimeRange::CurrentPeriod, "Current Period"),
    ('3', TimeRange::Days(30), "30 Days"),
    ('6', TimeRange::Days(60), "60 Days"),
    ('9', TimeRange::Days(90), "90 Days"),
    ('a', TimeRange::All, "All"),
];

pub struct TimeRangeWidget;

impl TimeRangeWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut buttons = Vec::new();
        for (key, range, label) in CHOICES {
            let style = if range == state.time_range {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            buttons.push(Span::styled(format!(" [{}] {} ", key, label), style));
            buttons.push(Span::raw(" "));
        }

        let details = match &state.report {
            Some(report) => Line::from(vec![
                Span::styled(
                    report.range_span().to_string(),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled("  |  Events in range: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    report.view().event_count().to_string(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            None => Line::from(Span::styled(
                state.time_range.label(),
                Style::default().fg(Color::Gray),
            )),
        };

        let selector = Paragraph::new(vec![Line::from(buttons), details])
            .block(Block::bordered().title(format!("Showing: {}", state.time_range.label())))
            .alignment(Alignment::Center);

        frame.render_widget(selector, area);
    }
}
