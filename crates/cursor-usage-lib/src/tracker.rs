use crate::data_structures::{StoredScrape, TimeRange, UsageReport};
use crate::extractor::Extractor;
use crate::processor::UsageProcessor;
use crate::scraper::ActiveTabScraper;
use crate::storage::Storage;
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

/// Outcome of a user-triggered refresh, shown inline by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStatus {
    Extracted,
    NoActiveTab,
    NotDashboard,
    Failed(String),
}

impl RefreshStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshStatus::Extracted)
    }
}

impl fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshStatus::Extracted => write!(f, "Data extracted!"),
            RefreshStatus::NoActiveTab => write!(f, "Please open cursor.com in a tab first"),
            RefreshStatus::NotDashboard => write!(f, "Please visit cursor.com"),
            RefreshStatus::Failed(reason) => write!(f, "Extraction failed: {}", reason),
        }
    }
}

pub struct UsageTracker<S: Storage> {
    storage: S,
    extractor: Extractor,
    processor: UsageProcessor,
}

impl<S: Storage> UsageTracker<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            extractor: Extractor::new(),
            processor: UsageProcessor::new(),
        }
    }

    /// Scrapes the active page and stores the result. Never retries.
    pub fn refresh(&mut self, scraper: &dyn ActiveTabScraper, now: DateTime<Utc>) -> RefreshStatus {
        match self.try_refresh(scraper, now) {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Error extracting data: {:#}", e);
                RefreshStatus::Failed(e.to_string())
            }
        }
    }

    fn try_refresh(
        &mut self,
        scraper: &dyn ActiveTabScraper,
        now: DateTime<Utc>,
    ) -> Result<RefreshStatus> {
        let Some(page) = scraper.active_page()? else {
            return Ok(RefreshStatus::NoActiveTab);
        };

        if !self.extractor.is_dashboard_url(&page.url) {
            tracing::info!(url = %page.url, "Active page is not the Cursor dashboard");
            return Ok(RefreshStatus::NotDashboard);
        }

        let scrape = self.extractor.extract(&page, now);
        self.storage.save(&StoredScrape::new(scrape, now))?;

        tracing::info!("Stored fresh dashboard scrape");
        Ok(RefreshStatus::Extracted)
    }

    pub fn load(&self) -> Result<Option<StoredScrape>> {
        self.storage.load()
    }

    /// `Ok(None)` when nothing usable has been stored yet.
    pub fn report(&self, range: TimeRange, now: NaiveDateTime) -> Result<Option<UsageReport>> {
        let Some(stored) = self.storage.load()? else {
            return Ok(None);
        };
        Ok(self.processor.report(&stored, range, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::PageSnapshot;
    use crate::storage::{JsonFileStorage, MemoryStorage};
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    struct FixedPage(Option<PageSnapshot>);

    impl ActiveTabScraper for FixedPage {
        fn active_page(&self) -> Result<Option<PageSnapshot>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenHost;

    impl ActiveTabScraper for BrokenHost {
        fn active_page(&self) -> Result<Option<PageSnapshot>> {
            Err(anyhow::anyhow!("tab went away"))
        }
    }

    fn dashboard(url: &str) -> PageSnapshot {
        PageSnapshot {
            url: url.to_string(),
            body_text: "Ultra Plan\nOn-Demand Usage is On\n$48.10".to_string(),
            tables: vec![vec![
                vec!["Date", "Model", "Kind", "Tokens", "Cost"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                vec!["Sep 20, 07:11 AM", "gpt", "Included", "1.2M", "$48.10"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ]],
            progress_bars: Vec::new(),
        }
    }

    fn scraped_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 25, 10, 0, 0).unwrap()
    }

    fn local_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 25)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_refresh_stores_scrape() {
        let mut tracker = UsageTracker::new(MemoryStorage::new());
        let status = tracker.refresh(
            &FixedPage(Some(dashboard("https://cursor.com/dashboard"))),
            scraped_at(),
        );

        assert_eq!(status, RefreshStatus::Extracted);
        assert!(status.is_success());

        let stored = tracker.load().unwrap().unwrap();
        assert_eq!(stored.last_updated(), scraped_at());
        assert_eq!(stored.cursor_data().plan(), Some("Ultra Plan"));
    }

    #[test]
    fn test_refresh_without_tab() {
        let mut tracker = UsageTracker::new(MemoryStorage::new());
        let status = tracker.refresh(&FixedPage(None), scraped_at());

        assert_eq!(status, RefreshStatus::NoActiveTab);
        assert_eq!(status.to_string(), "Please open cursor.com in a tab first");
        assert!(tracker.load().unwrap().is_none());
    }

    #[test]
    fn test_refresh_on_other_site_keeps_previous_record() {
        let mut tracker = UsageTracker::new(MemoryStorage::new());
        tracker.refresh(
            &FixedPage(Some(dashboard("https://cursor.com/dashboard"))),
            scraped_at(),
        );

        let status = tracker.refresh(
            &FixedPage(Some(dashboard("https://example.com/"))),
            scraped_at() + chrono::Duration::hours(1),
        );

        assert_eq!(status, RefreshStatus::NotDashboard);
        assert_eq!(tracker.load().unwrap().unwrap().last_updated(), scraped_at());
    }

    #[test]
    fn test_refresh_reports_host_errors_as_status() {
        let mut tracker = UsageTracker::new(MemoryStorage::new());
        let status = tracker.refresh(&BrokenHost, scraped_at());

        assert_eq!(status, RefreshStatus::Failed("tab went away".to_string()));
        assert_eq!(status.to_string(), "Extraction failed: tab went away");
    }

    #[test]
    fn test_report_after_refresh() {
        let dir = TempDir::new().unwrap();
        let mut tracker = UsageTracker::new(JsonFileStorage::new(dir.path().join("state.json")));
        assert!(tracker.report(TimeRange::CurrentPeriod, local_now()).unwrap().is_none());

        tracker.refresh(
            &FixedPage(Some(dashboard("https://cursor.com/dashboard"))),
            scraped_at(),
        );
        let report = tracker
            .report(TimeRange::CurrentPeriod, local_now())
            .unwrap()
            .unwrap();

        assert_eq!(report.view().total_tokens(), 1_200_000);
        assert!((report.view().total_cost() - 48.10).abs() < 1e-9);
        assert_eq!(report.subscription().subscription_price(), 200.0);
        assert_eq!(report.subscription().usage_percentage(), 24);
        assert_eq!(report.last_updated(), Some(scraped_at()));
    }
}
