use crate::data_structures::{OnDemandUsage, PageSnapshot, ProgressReading, RawScrape, Table};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static DOLLAR_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[\d,]+\.?\d*").unwrap());
static TOKEN_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[\d,]+\s*tokens?").unwrap());
static REQUEST_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[\d,]+\s*requests?").unwrap());

/// Checked in order; the first plan name found in the page text wins.
const PLAN_NAMES: [&str; 5] = [
    "Ultra Plan",
    "Pro+ Plan",
    "Pro Plan",
    "Business Plan",
    "Free Plan",
];

const DASHBOARD_HOST: &str = "cursor.com";

pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    pub fn is_dashboard_url(&self, url: &str) -> bool {
        url.contains(DASHBOARD_HOST)
    }

    pub fn extract(&self, page: &PageSnapshot, now: DateTime<Utc>) -> RawScrape {
        let body = page.body_text.as_str();
        let mut scrape = RawScrape::new().with_source(page.url.clone(), now);

        if let Some(plan) = PLAN_NAMES.iter().find(|plan| body.contains(*plan)) {
            scrape = scrape.with_plan(*plan);
        }

        if body.contains("On-Demand Usage is Off") {
            scrape = scrape.with_on_demand_usage(OnDemandUsage::Off);
        } else if body.contains("On-Demand Usage is On") {
            scrape = scrape.with_on_demand_usage(OnDemandUsage::On);
        }

        scrape = scrape
            .with_subscription_access(body.contains("Manage Subscription"))
            .with_dollar_amounts(find_all(&DOLLAR_AMOUNT, body))
            .with_token_counts(find_all(&TOKEN_MENTION, body))
            .with_request_counts(find_all(&REQUEST_MENTION, body));

        for table in page.tables.iter().filter(|table| !table.is_empty()) {
            scrape = scrape.with_table(trim_cells(table));
        }

        for bar in &page.progress_bars {
            if let (Some(value), Some(max)) = (bar.value, bar.max) {
                if let Some(reading) = ProgressReading::new(value, max) {
                    scrape = scrape.with_progress(reading);
                }
            }
        }

        let scrape = scrape.mark_extracted();
        tracing::debug!(
            url = %page.url,
            plan = ?scrape.plan(),
            tables = scrape.table_data().len(),
            dollar_amounts = scrape.dollar_amounts().len(),
            "Extracted dashboard page"
        );
        scrape
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

fn find_all(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn trim_cells(table: &Table) -> Table {
    table
        .iter()
        .map(|row| row.iter().map(|cell| cell.trim().to_string()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::ProgressBar;

    fn dashboard_page() -> PageSnapshot {
        PageSnapshot {
            url: "https://cursor.com/dashboard?tab=usage".to_string(),
            body_text: "Pro Plan\nManage Subscription\nOn-Demand Usage is Off\n\
                        You've used $12.40 of $20.00 this month\n1,204 requests\n52,000 tokens"
                .to_string(),
            tables: vec![
                vec![
                    vec!["Date".into(), "Model".into(), "Kind".into(), "Tokens".into(), "Cost".into()],
                    vec![
                        " Sep 20, 07:11 AM ".into(),
                        "gpt-5".into(),
                        "Included".into(),
                        "12K".into(),
                        "$0.24".into(),
                    ],
                ],
                Vec::new(),
            ],
            progress_bars: vec![
                ProgressBar {
                    value: Some(62),
                    max: Some(100),
                },
                ProgressBar {
                    value: Some(3),
                    max: None,
                },
            ],
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-09-25T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_extract_dashboard_page() {
        let scrape = Extractor::new().extract(&dashboard_page(), now());

        assert!(scrape.is_extracted());
        assert_eq!(scrape.plan(), Some("Pro Plan"));
        assert_eq!(scrape.on_demand_usage(), Some(OnDemandUsage::Off));
        assert!(scrape.has_subscription_access());
        assert_eq!(scrape.dollar_amounts(), &["$12.40", "$20.00"]);
        assert_eq!(scrape.request_counts(), &["1,204 requests"]);
        assert_eq!(scrape.token_counts(), &["52,000 tokens"]);
        assert_eq!(scrape.timestamp(), Some(now()));
        assert_eq!(scrape.url(), Some("https://cursor.com/dashboard?tab=usage"));
    }

    #[test]
    fn test_extract_keeps_non_empty_tables_with_trimmed_cells() {
        let scrape = Extractor::new().extract(&dashboard_page(), now());

        assert_eq!(scrape.table_data().len(), 1);
        let table = scrape.usage_table().unwrap();
        assert_eq!(table[1][0], "Sep 20, 07:11 AM");
    }

    #[test]
    fn test_extract_progress_bars_need_value_and_max() {
        let scrape = Extractor::new().extract(&dashboard_page(), now());

        assert_eq!(scrape.progress_data().len(), 1);
        assert_eq!(scrape.progress_data()[0].percentage(), 62);
    }

    #[test]
    fn test_plan_detection_prefers_specific_names() {
        let extractor = Extractor::new();
        let mut page = dashboard_page();

        page.body_text = "Your Pro+ Plan renews soon".to_string();
        assert_eq!(extractor.extract(&page, now()).plan(), Some("Pro+ Plan"));

        page.body_text = "Business Plan".to_string();
        assert_eq!(extractor.extract(&page, now()).plan(), Some("Business Plan"));

        page.body_text = "Nothing here".to_string();
        let scrape = extractor.extract(&page, now());
        assert_eq!(scrape.plan(), None);
        assert_eq!(scrape.on_demand_usage(), None);
        assert!(scrape.dollar_amounts().is_empty());
    }

    #[test]
    fn test_dashboard_url() {
        let extractor = Extractor::new();
        assert!(extractor.is_dashboard_url("https://cursor.com/dashboard"));
        assert!(!extractor.is_dashboard_url("https://example.com/"));
    }
}
