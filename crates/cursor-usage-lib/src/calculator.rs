use crate::data_structures::{
    BillingPeriod, ProcessedView, SubscriptionMetrics, TimeRange, UsageAverages, UsageEvent,
};
use crate::pricing::PlanPricing;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Day of month on which a billing period starts.
pub const BILLING_DAY: u32 = 15;

pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }

    /// 15th-to-14th period containing `now`.
    pub fn billing_period(&self, now: NaiveDateTime) -> BillingPeriod {
        let today = now.date();
        let (year, month) = (today.year(), today.month());

        let (start, end) = if today.day() >= BILLING_DAY {
            let (next_year, next_month) = next_month(year, month);
            (
                ymd(year, month, BILLING_DAY),
                ymd(next_year, next_month, BILLING_DAY - 1),
            )
        } else {
            let (prev_year, prev_month) = previous_month(year, month);
            (
                ymd(prev_year, prev_month, BILLING_DAY),
                ymd(year, month, BILLING_DAY - 1),
            )
        };

        BillingPeriod::new(start, end, now)
    }

    /// Oldest event time still inside `range`; `None` keeps everything.
    pub fn cutoff(&self, range: TimeRange, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match range {
            TimeRange::CurrentPeriod => Some(self.billing_period(now).start_time()),
            TimeRange::Days(days) => days_before(now, days),
            TimeRange::All => None,
        }
    }

    pub fn filter_events(
        &self,
        events: Vec<UsageEvent>,
        cutoff: Option<NaiveDateTime>,
    ) -> Vec<UsageEvent> {
        match cutoff {
            Some(cutoff) => events
                .into_iter()
                .filter(|event| event.event_date() >= cutoff)
                .collect(),
            None => events,
        }
    }

    /// Number of days the per-day averages divide by.
    pub fn window_days(&self, range: TimeRange, view: &ProcessedView, now: NaiveDateTime) -> f64 {
        let days = match range {
            TimeRange::CurrentPeriod => UsageAverages::MONTH_DAYS,
            TimeRange::Days(days) => f64::from(days),
            TimeRange::All => match view.earliest() {
                Some(earliest) => {
                    let span = (now - earliest).num_seconds() as f64 / 86_400.0;
                    span.ceil()
                }
                None => 1.0,
            },
        };
        days.max(1.0)
    }

    pub fn averages(
        &self,
        view: &ProcessedView,
        range: TimeRange,
        now: NaiveDateTime,
    ) -> UsageAverages {
        UsageAverages::new(
            self.window_days(range, view, now),
            view.total_cost(),
            view.total_tokens(),
            view.event_count(),
        )
    }

    pub fn subscription_metrics(
        &self,
        view: &ProcessedView,
        pricing: &PlanPricing,
    ) -> SubscriptionMetrics {
        SubscriptionMetrics::new(
            pricing.subscription_price(view.plan()),
            view.total_cost(),
            view.total_tokens(),
        )
    }

    /// Calendar span shown next to the time-range selector.
    pub fn range_span(&self, range: TimeRange, billing: &BillingPeriod, now: NaiveDateTime) -> String {
        match range {
            TimeRange::CurrentPeriod => billing.formatted(),
            TimeRange::Days(days) => match days_before(now, days) {
                Some(start) => format!(
                    "{} - {}",
                    start.format("%-m/%-d/%Y"),
                    now.format("%-m/%-d/%Y")
                ),
                None => "All stored events".to_string(),
            },
            TimeRange::All => "All stored events".to_string(),
        }
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

/// `None` once the window reaches past the calendar, which keeps every event.
fn days_before(now: NaiveDateTime, days: u32) -> Option<NaiveDateTime> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Days 14 and 15 exist in every month.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::RawScrape;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn event_at(date: NaiveDateTime) -> UsageEvent {
        UsageEvent::new(
            String::new(),
            date,
            false,
            "gpt".to_string(),
            "Included".to_string(),
            "1K".to_string(),
            "$0.10".to_string(),
            Some(1_000),
            Some(0.10),
        )
    }

    #[test]
    fn test_billing_period_after_the_fifteenth() {
        let calculator = Calculator::new();
        let period = calculator.billing_period(at(2025, 9, 25, 12));

        assert_eq!(period.start(), NaiveDate::from_ymd_opt(2025, 9, 15).unwrap());
        assert_eq!(period.end(), NaiveDate::from_ymd_opt(2025, 10, 14).unwrap());
    }

    #[test]
    fn test_billing_period_before_the_fifteenth() {
        let calculator = Calculator::new();
        let period = calculator.billing_period(at(2025, 9, 3, 8));

        assert_eq!(period.start(), NaiveDate::from_ymd_opt(2025, 8, 15).unwrap());
        assert_eq!(period.end(), NaiveDate::from_ymd_opt(2025, 9, 14).unwrap());
        assert_eq!(period.total_days(), 30);
    }

    #[test]
    fn test_billing_period_wraps_years() {
        let calculator = Calculator::new();

        let december = calculator.billing_period(at(2025, 12, 20, 0));
        assert_eq!(december.end(), NaiveDate::from_ymd_opt(2026, 1, 14).unwrap());

        let january = calculator.billing_period(at(2026, 1, 10, 0));
        assert_eq!(january.start(), NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());
    }

    #[test]
    fn test_billing_period_contains_today_for_every_day() {
        let calculator = Calculator::new();
        let mut day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();

        while day <= last {
            let period = calculator.billing_period(day.and_hms_opt(9, 30, 0).unwrap());
            assert!(period.contains(day), "{} not in {}", day, period.formatted());
            assert!(period.days_remaining() >= 0);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_cutoff_for_each_range() {
        let calculator = Calculator::new();
        let now = at(2025, 9, 25, 12);

        assert_eq!(
            calculator.cutoff(TimeRange::CurrentPeriod, now),
            Some(at(2025, 9, 15, 0))
        );
        assert_eq!(
            calculator.cutoff(TimeRange::Days(30), now),
            Some(at(2025, 8, 26, 12))
        );
        assert_eq!(calculator.cutoff(TimeRange::All, now), None);
    }

    #[test]
    fn test_filter_is_subset_above_cutoff() {
        let calculator = Calculator::new();
        let events: Vec<UsageEvent> = [1, 5, 10, 20, 25]
            .iter()
            .map(|day| event_at(at(2025, 9, *day, 6)))
            .collect();
        let cutoff = at(2025, 9, 10, 0);

        let kept = calculator.filter_events(events.clone(), Some(cutoff));

        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|event| event.event_date() >= cutoff));
        assert!(kept.iter().all(|event| events.contains(event)));
        assert_eq!(calculator.filter_events(events.clone(), None), events);
    }

    #[test]
    fn test_window_days() {
        let calculator = Calculator::new();
        let now = at(2025, 9, 25, 12);
        let empty = ProcessedView::new(&RawScrape::new(), Vec::new());

        assert_eq!(calculator.window_days(TimeRange::CurrentPeriod, &empty, now), 30.0);
        assert_eq!(calculator.window_days(TimeRange::Days(90), &empty, now), 90.0);
        assert_eq!(calculator.window_days(TimeRange::All, &empty, now), 1.0);

        let mut view = ProcessedView::new(&RawScrape::new(), Vec::new());
        view.add_event(event_at(at(2025, 9, 20, 6)), now.date());
        assert_eq!(calculator.window_days(TimeRange::All, &view, now), 6.0);
    }

    #[test]
    fn test_averages_and_projection() {
        let calculator = Calculator::new();
        let now = at(2025, 9, 25, 12);
        let mut view = ProcessedView::new(&RawScrape::new(), Vec::new());
        for day in 16..=25 {
            view.add_event(event_at(at(2025, 9, day, 6)), now.date());
        }

        let averages = calculator.averages(&view, TimeRange::Days(10), now);
        assert!((averages.avg_cost_per_day() - 0.10).abs() < 1e-9);
        assert_eq!(averages.avg_tokens_per_day(), 1_000.0);
        assert_eq!(averages.avg_events_per_day(), 1.0);
        assert!((averages.projected_monthly_cost() - 3.0).abs() < 1e-9);
        assert_eq!(averages.projected_monthly_tokens(), 30_000.0);
    }

    #[test]
    fn test_subscription_metrics_use_plan_price() {
        let calculator = Calculator::new();
        let pricing = PlanPricing::new();
        let raw = RawScrape::new().with_plan("Business Plan");
        let mut view = ProcessedView::new(&raw, Vec::new());
        view.add_event(event_at(at(2025, 9, 20, 6)), NaiveDate::MIN);

        let metrics = calculator.subscription_metrics(&view, &pricing);
        assert_eq!(metrics.subscription_price(), 40.0);
        assert!((metrics.remaining_budget() - 39.9).abs() < 1e-9);
        assert_eq!(metrics.usage_percentage(), 0);
        assert_eq!(metrics.tokens_per_dollar(), 10_000);
    }

    #[test]
    fn test_range_span() {
        let calculator = Calculator::new();
        let now = at(2025, 9, 25, 12);
        let billing = calculator.billing_period(now);

        assert_eq!(
            calculator.range_span(TimeRange::CurrentPeriod, &billing, now),
            "September 15, 2025 - October 14, 2025"
        );
        assert_eq!(
            calculator.range_span(TimeRange::Days(30), &billing, now),
            "8/26/2025 - 9/25/2025"
        );
    }

    #[test]
    fn test_day_count_past_the_calendar_keeps_everything() {
        let calculator = Calculator::new();
        let now = at(2025, 9, 25, 12);
        let billing = calculator.billing_period(now);

        assert_eq!(calculator.cutoff(TimeRange::Days(100_000_000), now), None);
        assert_eq!(
            calculator.range_span(TimeRange::Days(100_000_000), &billing, now),
            "All stored events"
        );
    }
}
