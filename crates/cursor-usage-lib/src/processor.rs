use crate::calculator::Calculator;
use crate::data_structures::{
    ProcessedView, RawScrape, StoredScrape, TimeRange, UsageEvent, UsageReport,
};
use crate::parser;
use crate::pricing::PlanPricing;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

/// Date, model, kind, tokens, cost.
const MIN_ROW_CELLS: usize = 5;

/// Turns a stored scrape into the numbers the dashboard shows.
///
/// Every method is a pure function of its arguments: the time range and the
/// clock are passed in on each call and nothing is cached between calls.
pub struct UsageProcessor {
    calculator: Calculator,
    pricing: PlanPricing,
}

impl UsageProcessor {
    pub fn new() -> Self {
        Self {
            calculator: Calculator::new(),
            pricing: PlanPricing::new(),
        }
    }

    /// Parses every row of the usage table, in table order.
    ///
    /// The leading row is a header unless its first cell reads as a date.
    /// Rows with fewer than five cells are dropped.
    pub fn parse_events(&self, raw: &RawScrape, now: NaiveDateTime) -> Vec<UsageEvent> {
        let Some(table) = raw.usage_table() else {
            return Vec::new();
        };

        let skip_header = table
            .first()
            .and_then(|row| row.first())
            .map(|cell| parser::try_parse_event_date(cell, now.year()).is_none())
            .unwrap_or(false);

        let mut events = Vec::new();
        for row in table.iter().skip(usize::from(skip_header)) {
            if row.len() < MIN_ROW_CELLS {
                tracing::debug!(cells = row.len(), "Skipping short usage row");
                continue;
            }

            let (event_date, date_is_fallback) = parser::parse_event_date(&row[0], now);
            events.push(UsageEvent::new(
                row[0].clone(),
                event_date,
                date_is_fallback,
                row[1].clone(),
                row[2].clone(),
                row[3].clone(),
                row[4].clone(),
                parser::parse_token_count(&row[3]),
                parser::parse_cost(&row[4]),
            ));
        }

        events
    }

    pub fn process(&self, raw: &RawScrape, range: TimeRange, now: NaiveDateTime) -> ProcessedView {
        let page_amounts = raw
            .dollar_amounts()
            .iter()
            .filter_map(|amount| parser::parse_dollar_amount(amount))
            .filter(|amount| *amount > 0.0)
            .collect();

        let cutoff = self.calculator.cutoff(range, now);
        let events = self
            .calculator
            .filter_events(self.parse_events(raw, now), cutoff);

        let mut view = ProcessedView::new(raw, page_amounts);
        for event in events {
            view.add_event(event, now.date());
        }

        if view.fallback_dated_events() > 0 {
            tracing::warn!(
                count = view.fallback_dated_events(),
                "Usage rows with unreadable dates were counted as happening now"
            );
        }

        view
    }

    pub fn build_report(
        &self,
        raw: &RawScrape,
        range: TimeRange,
        now: NaiveDateTime,
    ) -> UsageReport {
        self.assemble_report(raw, range, now, raw.timestamp())
    }

    /// Report for a persisted record; `None` when the scrape never completed.
    pub fn report(
        &self,
        stored: &StoredScrape,
        range: TimeRange,
        now: NaiveDateTime,
    ) -> Option<UsageReport> {
        if !stored.cursor_data().is_extracted() {
            return None;
        }

        Some(self.assemble_report(
            stored.cursor_data(),
            range,
            now,
            Some(stored.last_updated()),
        ))
    }

    fn assemble_report(
        &self,
        raw: &RawScrape,
        range: TimeRange,
        now: NaiveDateTime,
        last_updated: Option<DateTime<Utc>>,
    ) -> UsageReport {
        let view = self.process(raw, range, now);
        let billing = self.calculator.billing_period(now);
        let averages = self.calculator.averages(&view, range, now);
        let subscription = self.calculator.subscription_metrics(&view, &self.pricing);
        let range_span = self.calculator.range_span(range, &billing, now);

        UsageReport::new(
            range,
            last_updated,
            view,
            billing,
            averages,
            subscription,
            range_span,
        )
    }
}

impl Default for UsageProcessor {
    fn default() -> Self {
        Self::new()
    }
}
