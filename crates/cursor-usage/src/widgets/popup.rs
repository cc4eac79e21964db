use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    Frame,
};

use crate::report::{format_count, RECENT_EVENTS};
use crate::AppState;

pub struct PopupWidget;

impl PopupWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let popup_area = Self::centered_rect(70, 80, area);

        // Clear the area first
        frame.render_widget(Clear, popup_area);

        let activity_text = Self::create_activity_text(state);

        let popup = Paragraph::new(activity_text)
            .block(
                Block::bordered()
                    .title(format!("Recent Activity ({})", state.time_range.label()))
                    .title_alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Left);

        frame.render_widget(popup, popup_area);
    }

    fn create_activity_text(state: &AppState) -> Vec<Line> {
        let mut activity_text = Vec::new();

        match &state.report {
            Some(report) if !report.view().is_empty() => {
                let view = report.view();

                for event in view.usage_events().iter().take(RECENT_EVENTS) {
                    activity_text.push(Line::from(vec![
                        Span::styled(
                            format!("{} tokens", event.tokens_text()),
                            Style::default()
                                .fg(Color::Yellow)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(" - ", Style::default().fg(Color::Gray)),
                        Span::styled(
                            event.cost_text().to_string(),
                            Style::default().fg(Color::Green),
                        ),
                        Span::styled(
                            format!("  {} • {}", event.date(), event.model()),
                            Style::default().fg(if event.is_error() {
                                Color::Red
                            } else {
                                Color::Gray
                            }),
                        ),
                    ]));
                }

                if view.event_count() > RECENT_EVENTS {
                    activity_text.push(Line::from(vec![Span::styled(
                        format!("...and {} more events", view.event_count() - RECENT_EVENTS),
                        Style::default().fg(Color::Gray),
                    )]));
                }

                activity_text.push(Line::from(" "));
                activity_text.push(Line::from(vec![Span::styled(
                    "Daily Breakdown:",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )]));

                for (date, activity) in view.events_by_date().iter().rev() {
                    activity_text.push(Line::from(vec![Span::styled(
                        format!(
                            "  {}: {} events, {} tokens, ${:.2}",
                            date.format("%b %-d"),
                            activity.events(),
                            format_count(activity.tokens()),
                            activity.cost()
                        ),
                        Style::default().fg(Color::White),
                    )]));
                }
            }
            _ => {
                activity_text.push(Line::from(vec![Span::styled(
                    "No events in range",
                    Style::default().fg(Color::Red),
                )]));
            }
        }

        activity_text.extend(vec![
            Line::from(" "),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "e",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to close", Style::default().fg(Color::Gray)),
            ]),
        ]);

        activity_text
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = ratatui::layout::Layout::default()
            .direction(ratatui::layout::Direction::Vertical)
            .constraints([
                ratatui::layout::Constraint::Percentage((100 - percent_y) / 2),
                ratatui::layout::Constraint::Percentage(percent_y),
                ratatui::layout::Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        ratatui::layout::Layout::default()
            .direction(ratatui::layout::Direction::Horizontal)
            .constraints([
                ratatui::layout::Constraint::Percentage((100 - percent_x) / 2),
                ratatui::layout::Constraint::Percentage(percent_x),
                ratatui::layout::Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
