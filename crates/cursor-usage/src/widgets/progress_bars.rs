use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Gauge},
    Frame,
};

use crate::AppState;

pub struct ProgressBarsWidget;

impl ProgressBarsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let Some(report) = &state.report else {
            frame.render_widget(Block::bordered().title("Billing Period"), chunks[0]);
            frame.render_widget(Block::bordered().title("Subscription Used"), chunks[1]);
            return;
        };

        let billing = report.billing();
        let period_gauge = Gauge::default()
            .block(Block::bordered().title(format!("Billing Period ({})", billing.month_label())))
            .gauge_style(Style::default().fg(Color::Blue))
            .percent(billing.progress_percentage().clamp(0, 100) as u16)
            .label(format!(
                "Day {} of {}, {} left",
                billing.days_elapsed(),
                billing.total_days(),
                billing.days_remaining()
            ));

        frame.render_widget(period_gauge, chunks[0]);

        let usage_percentage = report.subscription().usage_percentage();
        let usage_gauge = Gauge::default()
            .block(Block::bordered().title("Subscription Used"))
            .gauge_style(if usage_percentage > 80 {
                Style::default().fg(Color::Red)
            } else if usage_percentage > 60 {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Green)
            })
            .percent(usage_percentage.min(100) as u16)
            .label(format!(
                "{}% of ${}",
                usage_percentage,
                report.subscription().subscription_price()
            ));

        frame.render_widget(usage_gauge, chunks[1]);
    }
}
