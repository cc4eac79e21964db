use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::report::format_count;
use crate::AppState;

pub struct StatisticsWidget;

impl StatisticsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut stats_text = Vec::new();

        if let Some(report) = &state.report {
            let view = report.view();
            let averages = report.averages();
            let subscription = report.subscription();

            stats_text.push(Self::stat(
                "Used: ",
                format!("${:.2}", view.total_cost()),
                Color::Yellow,
            ));
            stats_text.push(Self::stat(
                "Remaining Budget: ",
                format!("${:.2}", subscription.remaining_budget()),
                if subscription.remaining_budget() < 2.0 {
                    Color::Red
                } else {
                    Color::Green
                },
            ));
            stats_text.push(Self::stat(
                "Requests: ",
                format!(
                    "{} (avg ${:.4}, max ${:.3})",
                    view.costs().len(),
                    view.average_cost_per_request().unwrap_or(0.0),
                    view.most_expensive_request().unwrap_or(0.0)
                ),
                Color::White,
            ));
            stats_text.push(Self::stat(
                "Price/Token: ",
                format!("${:.6}", subscription.price_per_token()),
                Color::White,
            ));
            stats_text.push(Self::stat(
                "Tokens: ",
                format!(
                    "{:.2}M ({:.0}K/day)",
                    view.total_tokens() as f64 / 1_000_000.0,
                    averages.avg_tokens_per_day() / 1_000.0
                ),
                Color::Yellow,
            ));
            stats_text.push(Self::stat(
                "Largest Request: ",
                format!("{} tokens", format_count(view.largest_request().unwrap_or(0))),
                Color::White,
            ));
            stats_text.push(Self::stat(
                "Token Efficiency: ",
                format!("{} tokens/$", format_count(subscription.tokens_per_dollar())),
                Color::White,
            ));
            stats_text.push(Self::stat(
                "Events: ",
                format!(
                    "{} total, {} today, {:.1}/day",
                    view.event_count(),
                    view.today_events(),
                    averages.avg_events_per_day()
                ),
                Color::Cyan,
            ));
            stats_text.push(Self::stat(
                "Error Rate: ",
                format!("{:.1}%", view.error_rate()),
                if view.error_rate() > 5.0 {
                    Color::Red
                } else {
                    Color::Green
                },
            ));
            stats_text.push(Self::stat("Date Range: ", view.date_range(), Color::Cyan));
            if view.fallback_dated_events() > 0 {
                stats_text.push(Self::stat(
                    "Undated Events: ",
                    view.fallback_dated_events().to_string(),
                    Color::Yellow,
                ));
            }
        } else {
            stats_text.push(Line::from(vec![Span::styled(
                "No data",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]));
        }

        if let Some(error) = &state.error_message {
            stats_text.push(Line::from(vec![
                Span::styled("Error: ", Style::default().fg(Color::Red)),
                Span::styled(
                    error.chars().take(50).collect::<String>()
                        + if error.len() > 50 { "..." } else { "" },
                    Style::default().fg(Color::Red),
                ),
            ]));
        }

        let stats = Paragraph::new(stats_text)
            .block(Block::bordered().title("Statistics"))
            .alignment(Alignment::Left);

        frame.render_widget(stats, area);
    }

    fn stat(label: &'static str, value: String, color: Color) -> Line<'static> {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::White)),
            Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ])
    }
}
