pub mod calculator;
pub mod data_structures;
pub mod extractor;
pub mod parser;
pub mod pricing;
pub mod processor;
pub mod scraper;
pub mod storage;
pub mod tracker;

pub use calculator::Calculator;
pub use data_structures::{
    BillingPeriod, DailyActivity, OnDemandUsage, PageSnapshot, ProcessedView, RawScrape,
    StoredScrape, SubscriptionMetrics, TimeRange, UsageAverages, UsageEvent, UsageReport,
};
pub use extractor::Extractor;
pub use pricing::PlanPricing;
pub use processor::UsageProcessor;
pub use scraper::{ActiveTabScraper, SnapshotFileScraper};
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
pub use tracker::{RefreshStatus, UsageTracker};

pub use anyhow::Result;
pub use chrono::{DateTime, NaiveDateTime, Utc};

pub mod prelude {
    pub use crate::data_structures::{TimeRange, UsageReport};
    pub use crate::storage::Storage;
    pub use crate::tracker::{RefreshStatus, UsageTracker};
    pub use anyhow::Result;
    pub use chrono::{DateTime, Utc};
}
