use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::report::NO_DATA_MESSAGE;
use crate::AppState;

pub struct PredictionsWidget;

impl PredictionsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let predictions_text = if let Some(report) = &state.report {
            let billing = report.billing();
            let averages = report.averages();
            let subscription = report.subscription();
            let projected = averages.projected_monthly_cost();
            let over_budget = projected > subscription.subscription_price();

            let mut predictions_text = vec![
                Line::from(vec![
                    Span::styled("Projected Monthly Cost: ", Style::default().fg(Color::White)),
                    Span::styled(
                        format!("${:.2}", projected),
                        Style::default()
                            .fg(if over_budget { Color::Red } else { Color::Green })
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Avg Cost/Day: ", Style::default().fg(Color::White)),
                    Span::styled(
                        format!("${:.3}", averages.avg_cost_per_day()),
                        Style::default().fg(Color::Yellow),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Days Remaining: ", Style::default().fg(Color::White)),
                    Span::styled(
                        format!("{} days", billing.days_remaining()),
                        Style::default()
                            .fg(if billing.days_remaining() <= 7 {
                                Color::Red
                            } else {
                                Color::Green
                            })
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Next Billing Date: ", Style::default().fg(Color::White)),
                    Span::styled(
                        billing.next_billing_date().format("%B %-d, %Y").to_string(),
                        Style::default().fg(Color::Blue),
                    ),
                ]),
            ];

            if let Some(on_demand) = report.view().on_demand_usage() {
                predictions_text.push(Line::from(vec![
                    Span::styled("On-Demand Usage: ", Style::default().fg(Color::White)),
                    Span::styled(
                        on_demand.as_str(),
                        Style::default().fg(if on_demand.as_str() == "Off" {
                            Color::Red
                        } else {
                            Color::Green
                        }),
                    ),
                ]));
            }

            if let Some(excess) = subscription.projected_overage(averages) {
                predictions_text.push(Line::from(" "));
                predictions_text.push(Line::from(vec![Span::styled(
                    format!("Projected cost exceeds subscription by ${:.2}", excess),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )]));
            }

            predictions_text
        } else {
            Self::render_no_data_text(state)
        };

        let predictions = Paragraph::new(predictions_text)
            .block(Block::bordered().title("Predictions"))
            .alignment(Alignment::Left);

        frame.render_widget(predictions, area);
    }

    fn render_no_data_text(state: &AppState) -> Vec<Line> {
        let mut no_data_text = vec![
            Line::from(vec![Span::styled(
                NO_DATA_MESSAGE,
                Style::default().fg(Color::Red),
            )]),
            Line::from(" "),
        ];

        if let Some(status) = &state.status_message {
            no_data_text.push(Line::from(vec![Span::styled(
                status.clone(),
                Style::default().fg(Color::Gray),
            )]));
        }

        no_data_text
    }
}
