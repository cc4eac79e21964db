use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Cells of one scraped table, row by row.
pub type Table = Vec<Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnDemandUsage {
    On,
    Off,
}

impl OnDemandUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnDemandUsage::On => "On",
            OnDemandUsage::Off => "Off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    CurrentPeriod,
    Days(u32),
    All,
}

impl TimeRange {
    pub fn label(&self) -> String {
        match self {
            TimeRange::CurrentPeriod => "Current Billing Period".to_string(),
            TimeRange::Days(days) => format!("Last {} Days", days),
            TimeRange::All => "All Time".to_string(),
        }
    }

    pub fn short_label(&self) -> String {
        match self {
            TimeRange::CurrentPeriod => "Current Period".to_string(),
            TimeRange::Days(days) => format!("{}d", days),
            TimeRange::All => "All".to_string(),
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::CurrentPeriod
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::CurrentPeriod => write!(f, "period"),
            TimeRange::Days(days) => write!(f, "{}", days),
            TimeRange::All => write!(f, "all"),
        }
    }
}

impl FromStr for TimeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "period" | "current" => Ok(TimeRange::CurrentPeriod),
            "all" => Ok(TimeRange::All),
            other => match other.parse::<u32>() {
                Ok(days) if days > 0 => Ok(TimeRange::Days(days)),
                _ => Err(anyhow::anyhow!(
                    "Invalid time range '{}': expected period, all, or a number of days",
                    s
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReading {
    value: u64,
    max: u64,
    percentage: u64,
}

impl ProgressReading {
    pub fn new(value: u64, max: u64) -> Option<Self> {
        if max == 0 {
            return None;
        }
        let percentage = ((value as f64 / max as f64) * 100.0).round() as u64;
        Some(Self {
            value,
            max,
            percentage,
        })
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn percentage(&self) -> u64 {
        self.percentage
    }
}

/// Text and tables of the active tab, as handed over by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub body_text: String,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub progress_bars: Vec<ProgressBar>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressBar {
    pub value: Option<u64>,
    pub max: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScrape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_demand_usage: Option<OnDemandUsage>,
    #[serde(default)]
    has_subscription_access: bool,
    #[serde(default)]
    dollar_amounts: Vec<String>,
    #[serde(default)]
    token_counts: Vec<String>,
    #[serde(default)]
    request_counts: Vec<String>,
    #[serde(default)]
    table_data: Vec<Table>,
    #[serde(default)]
    progress_data: Vec<ProgressReading>,
    #[serde(default)]
    extracted: bool,
}

impl RawScrape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, url: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        self.url = Some(url.into());
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    pub fn with_on_demand_usage(mut self, on_demand_usage: OnDemandUsage) -> Self {
        self.on_demand_usage = Some(on_demand_usage);
        self
    }

    pub fn with_subscription_access(mut self, has_access: bool) -> Self {
        self.has_subscription_access = has_access;
        self
    }

    pub fn with_dollar_amounts(mut self, amounts: Vec<String>) -> Self {
        self.dollar_amounts = amounts;
        self
    }

    pub fn with_token_counts(mut self, counts: Vec<String>) -> Self {
        self.token_counts = counts;
        self
    }

    pub fn with_request_counts(mut self, counts: Vec<String>) -> Self {
        self.request_counts = counts;
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.table_data.push(table);
        self
    }

    pub fn with_progress(mut self, reading: ProgressReading) -> Self {
        self.progress_data.push(reading);
        self
    }

    pub fn mark_extracted(mut self) -> Self {
        self.extracted = true;
        self
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn plan(&self) -> Option<&str> {
        self.plan.as_deref()
    }

    pub fn on_demand_usage(&self) -> Option<OnDemandUsage> {
        self.on_demand_usage
    }

    pub fn has_subscription_access(&self) -> bool {
        self.has_subscription_access
    }

    pub fn dollar_amounts(&self) -> &[String] {
        &self.dollar_amounts
    }

    pub fn token_counts(&self) -> &[String] {
        &self.token_counts
    }

    pub fn request_counts(&self) -> &[String] {
        &self.request_counts
    }

    pub fn table_data(&self) -> &[Table] {
        &self.table_data
    }

    /// The usage table is always the first table on the page.
    pub fn usage_table(&self) -> Option<&Table> {
        self.table_data.first()
    }

    pub fn progress_data(&self) -> &[ProgressReading] {
        &self.progress_data
    }

    pub fn is_extracted(&self) -> bool {
        self.extracted
    }
}

/// The persisted record: the latest scrape and when it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScrape {
    cursor_data: RawScrape,
    last_updated: DateTime<Utc>,
}

impl StoredScrape {
    pub fn new(cursor_data: RawScrape, last_updated: DateTime<Utc>) -> Self {
        Self {
            cursor_data,
            last_updated,
        }
    }

    pub fn cursor_data(&self) -> &RawScrape {
        &self.cursor_data
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent {
    date: String,
    event_date: NaiveDateTime,
    date_is_fallback: bool,
    model: String,
    kind: String,
    tokens_text: String,
    cost_text: String,
    tokens: Option<u64>,
    cost: Option<f64>,
}

impl UsageEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: String,
        event_date: NaiveDateTime,
        date_is_fallback: bool,
        model: String,
        kind: String,
        tokens_text: String,
        cost_text: String,
        tokens: Option<u64>,
        cost: Option<f64>,
    ) -> Self {
        Self {
            date,
            event_date,
            date_is_fallback,
            model,
            kind,
            tokens_text,
            cost_text,
            tokens,
            cost,
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn event_date(&self) -> NaiveDateTime {
        self.event_date
    }

    /// True when the date cell could not be parsed and the event was stamped with "now".
    pub fn date_is_fallback(&self) -> bool {
        self.date_is_fallback
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn tokens_text(&self) -> &str {
        &self.tokens_text
    }

    pub fn cost_text(&self) -> &str {
        &self.cost_text
    }

    pub fn tokens(&self) -> Option<u64> {
        self.tokens
    }

    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    pub fn is_error(&self) -> bool {
        self.kind.contains("Errored")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyActivity {
    events: u64,
    cost: f64,
    tokens: u64,
}

impl DailyActivity {
    pub fn add_event(&mut self, event: &UsageEvent) {
        self.events += 1;
        if let Some(tokens) = event.tokens() {
            self.tokens = self.tokens.saturating_add(tokens);
        }
        if let Some(cost) = event.cost().filter(|cost| *cost > 0.0) {
            self.cost += cost;
        }
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedView {
    plan: Option<String>,
    on_demand_usage: Option<OnDemandUsage>,
    has_subscription_access: bool,
    page_dollar_amounts: Vec<f64>,
    costs: Vec<f64>,
    tokens: Vec<u64>,
    usage_events: Vec<UsageEvent>,
    total_cost: f64,
    total_tokens: u64,
    today_events: usize,
    error_events: usize,
    fallback_dated_events: usize,
    events_by_date: BTreeMap<NaiveDate, DailyActivity>,
    earliest: Option<NaiveDateTime>,
    latest: Option<NaiveDateTime>,
}

impl ProcessedView {
    pub fn new(raw: &RawScrape, page_dollar_amounts: Vec<f64>) -> Self {
        Self {
            plan: raw.plan().map(str::to_string),
            on_demand_usage: raw.on_demand_usage(),
            has_subscription_access: raw.has_subscription_access(),
            page_dollar_amounts,
            costs: Vec::new(),
            tokens: Vec::new(),
            usage_events: Vec::new(),
            total_cost: 0.0,
            total_tokens: 0,
            today_events: 0,
            error_events: 0,
            fallback_dated_events: 0,
            events_by_date: BTreeMap::new(),
            earliest: None,
            latest: None,
        }
    }

    pub fn add_event(&mut self, event: UsageEvent, today: NaiveDate) {
        let at = event.event_date();
        self.earliest = Some(self.earliest.map_or(at, |earliest| earliest.min(at)));
        self.latest = Some(self.latest.map_or(at, |latest| latest.max(at)));

        if let Some(tokens) = event.tokens() {
            self.tokens.push(tokens);
            self.total_tokens = self.total_tokens.saturating_add(tokens);
        }
        if let Some(cost) = event.cost().filter(|cost| *cost > 0.0) {
            self.costs.push(cost);
            self.total_cost += cost;
        }
        if at.date() == today {
            self.today_events += 1;
        }
        if event.is_error() {
            self.error_events += 1;
        }
        if event.date_is_fallback() {
            self.fallback_dated_events += 1;
        }

        self.events_by_date
            .entry(at.date())
            .or_default()
            .add_event(&event);
        self.usage_events.push(event);
    }

    pub fn plan(&self) -> Option<&str> {
        self.plan.as_deref()
    }

    pub fn on_demand_usage(&self) -> Option<OnDemandUsage> {
        self.on_demand_usage
    }

    pub fn has_subscription_access(&self) -> bool {
        self.has_subscription_access
    }

    pub fn page_dollar_amounts(&self) -> &[f64] {
        &self.page_dollar_amounts
    }

    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    pub fn tokens(&self) -> &[u64] {
        &self.tokens
    }

    pub fn usage_events(&self) -> &[UsageEvent] {
        &self.usage_events
    }

    pub fn event_count(&self) -> usize {
        self.usage_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usage_events.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn today_events(&self) -> usize {
        self.today_events
    }

    pub fn error_events(&self) -> usize {
        self.error_events
    }

    pub fn fallback_dated_events(&self) -> usize {
        self.fallback_dated_events
    }

    pub fn events_by_date(&self) -> &BTreeMap<NaiveDate, DailyActivity> {
        &self.events_by_date
    }

    pub fn earliest(&self) -> Option<NaiveDateTime> {
        self.earliest
    }

    pub fn date_range(&self) -> String {
        match (self.earliest, self.latest) {
            (Some(earliest), Some(latest)) => format!(
                "{} - {}",
                earliest.format("%b %-d"),
                latest.format("%b %-d")
            ),
            _ => "No data in range".to_string(),
        }
    }

    /// Percentage of events whose kind is "Errored".
    pub fn error_rate(&self) -> f64 {
        if self.usage_events.is_empty() {
            return 0.0;
        }
        (self.error_events as f64 / self.usage_events.len() as f64) * 100.0
    }

    pub fn average_cost_per_request(&self) -> Option<f64> {
        if self.costs.is_empty() {
            return None;
        }
        Some(self.total_cost / self.costs.len() as f64)
    }

    pub fn most_expensive_request(&self) -> Option<f64> {
        self.costs.iter().copied().reduce(f64::max)
    }

    pub fn average_tokens_per_request(&self) -> Option<u64> {
        if self.tokens.is_empty() {
            return None;
        }
        Some((self.total_tokens as f64 / self.tokens.len() as f64).round() as u64)
    }

    pub fn largest_request(&self) -> Option<u64> {
        self.tokens.iter().copied().max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    start: NaiveDate,
    end: NaiveDate,
    total_days: i64,
    days_elapsed: i64,
    days_remaining: i64,
    progress_percentage: i64,
}

impl BillingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate, now: NaiveDateTime) -> Self {
        let start_time = start.and_time(chrono::NaiveTime::MIN);
        let total_days = (end - start).num_days();
        let days_elapsed = ceil_days(now - start_time);
        let days_remaining = (total_days - days_elapsed).max(0);
        let progress_percentage = if total_days > 0 {
            ((days_elapsed as f64 / total_days as f64) * 100.0).round() as i64
        } else {
            0
        };

        Self {
            start,
            end,
            total_days,
            days_elapsed,
            days_remaining,
            progress_percentage,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start.and_time(chrono::NaiveTime::MIN)
    }

    pub fn next_billing_date(&self) -> NaiveDate {
        self.end + Duration::days(1)
    }

    pub fn total_days(&self) -> i64 {
        self.total_days
    }

    pub fn days_elapsed(&self) -> i64 {
        self.days_elapsed
    }

    pub fn days_remaining(&self) -> i64 {
        self.days_remaining
    }

    pub fn progress_percentage(&self) -> i64 {
        self.progress_percentage
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// "September 2025" style label of the month the period starts in.
    pub fn month_label(&self) -> String {
        self.start.format("%B %Y").to_string()
    }

    pub fn formatted(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%B %-d, %Y"),
            self.end.format("%B %-d, %Y")
        )
    }
}

fn ceil_days(duration: Duration) -> i64 {
    let day = Duration::days(1).num_milliseconds();
    let millis = duration.num_milliseconds();
    millis.div_euclid(day) + i64::from(millis.rem_euclid(day) != 0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageAverages {
    window_days: f64,
    avg_cost_per_day: f64,
    avg_tokens_per_day: f64,
    avg_events_per_day: f64,
    projected_monthly_cost: f64,
    projected_monthly_tokens: f64,
}

impl UsageAverages {
    pub const MONTH_DAYS: f64 = 30.0;

    pub fn new(window_days: f64, total_cost: f64, total_tokens: u64, events: usize) -> Self {
        let window_days = window_days.max(1.0);
        let avg_cost_per_day = total_cost / window_days;
        let avg_tokens_per_day = total_tokens as f64 / window_days;
        let avg_events_per_day = events as f64 / window_days;

        Self {
            window_days,
            avg_cost_per_day,
            avg_tokens_per_day,
            avg_events_per_day,
            projected_monthly_cost: avg_cost_per_day * Self::MONTH_DAYS,
            projected_monthly_tokens: avg_tokens_per_day * Self::MONTH_DAYS,
        }
    }

    pub fn window_days(&self) -> f64 {
        self.window_days
    }

    pub fn avg_cost_per_day(&self) -> f64 {
        self.avg_cost_per_day
    }

    pub fn avg_tokens_per_day(&self) -> f64 {
        self.avg_tokens_per_day
    }

    pub fn avg_events_per_day(&self) -> f64 {
        self.avg_events_per_day
    }

    pub fn projected_monthly_cost(&self) -> f64 {
        self.projected_monthly_cost
    }

    pub fn projected_monthly_tokens(&self) -> f64 {
        self.projected_monthly_tokens
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscriptionMetrics {
    subscription_price: f64,
    remaining_budget: f64,
    usage_percentage: u32,
    price_per_token: f64,
    tokens_per_dollar: u64,
}

impl SubscriptionMetrics {
    pub fn new(subscription_price: f64, total_cost: f64, total_tokens: u64) -> Self {
        let usage_percentage = if subscription_price > 0.0 {
            ((total_cost / subscription_price) * 100.0).round().min(100.0) as u32
        } else if total_cost > 0.0 {
            100
        } else {
            0
        };
        let price_per_token = if total_tokens > 0 {
            total_cost / total_tokens as f64
        } else {
            0.0
        };
        let tokens_per_dollar = if total_cost > 0.0 {
            (total_tokens as f64 / total_cost).round() as u64
        } else {
            0
        };

        Self {
            subscription_price,
            remaining_budget: subscription_price - total_cost,
            usage_percentage,
            price_per_token,
            tokens_per_dollar,
        }
    }

    pub fn subscription_price(&self) -> f64 {
        self.subscription_price
    }

    /// Negative when usage ran past the subscription price.
    pub fn remaining_budget(&self) -> f64 {
        self.remaining_budget
    }

    pub fn usage_percentage(&self) -> u32 {
        self.usage_percentage
    }

    pub fn price_per_token(&self) -> f64 {
        self.price_per_token
    }

    pub fn tokens_per_dollar(&self) -> u64 {
        self.tokens_per_dollar
    }

    pub fn projected_overage(&self, averages: &UsageAverages) -> Option<f64> {
        let excess = averages.projected_monthly_cost() - self.subscription_price;
        (excess > 0.0).then_some(excess)
    }
}

/// Everything a presenter needs for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageReport {
    time_range: TimeRange,
    last_updated: Option<DateTime<Utc>>,
    view: ProcessedView,
    billing: BillingPeriod,
    averages: UsageAverages,
    subscription: SubscriptionMetrics,
    range_span: String,
}

impl UsageReport {
    pub fn new(
        time_range: TimeRange,
        last_updated: Option<DateTime<Utc>>,
        view: ProcessedView,
        billing: BillingPeriod,
        averages: UsageAverages,
        subscription: SubscriptionMetrics,
        range_span: String,
    ) -> Self {
        Self {
            time_range,
            last_updated,
            view,
            billing,
            averages,
            subscription,
            range_span,
        }
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn view(&self) -> &ProcessedView {
        &self.view
    }

    pub fn billing(&self) -> &BillingPeriod {
        &self.billing
    }

    pub fn averages(&self) -> &UsageAverages {
        &self.averages
    }

    pub fn subscription(&self) -> &SubscriptionMetrics {
        &self.subscription
    }

    /// Calendar span covered by the selected range.
    pub fn range_span(&self) -> &str {
        &self.range_span
    }
}
