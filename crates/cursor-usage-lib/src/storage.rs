use crate::data_structures::StoredScrape;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the latest scrape lives between runs. Last write wins.
pub trait Storage {
    fn load(&self) -> Result<Option<StoredScrape>>;
    fn save(&mut self, record: &StoredScrape) -> Result<()>;
}

/// Keeps the record as a single pretty-printed JSON document.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Option<StoredScrape>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No stored scrape yet");
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read file: {}", self.path.display()))?;
        let record: StoredScrape = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse stored scrape: {}", self.path.display()))?;

        Ok(Some(record))
    }

    fn save(&mut self, record: &StoredScrape) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(record).context("Failed to serialize stored scrape")?;

        // Write next to the target, then rename over it.
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to finalize file: {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "Saved scrape");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Option<StoredScrape>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: StoredScrape) -> Self {
        Self {
            record: Some(record),
        }
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<StoredScrape>> {
        Ok(self.record.clone())
    }

    fn save(&mut self, record: &StoredScrape) -> Result<()> {
        self.record = Some(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::RawScrape;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn record(plan: &str) -> StoredScrape {
        StoredScrape::new(
            RawScrape::new()
                .with_plan(plan)
                .with_dollar_amounts(vec!["$1.00".to_string()])
                .with_table(vec![vec!["Sep 20, 07:11 AM".to_string(); 5]])
                .mark_extracted(),
            Utc.with_ymd_and_hms(2025, 9, 25, 10, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("state.json"));

        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut storage = JsonFileStorage::new(dir.path().join("nested").join("state.json"));

        storage.save(&record("Pro Plan")).unwrap();
        let loaded = storage.load().unwrap().unwrap();

        assert_eq!(loaded, record("Pro Plan"));
        assert!(!dir.path().join("nested").join("state.tmp").exists());
    }

    #[test]
    fn test_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let mut storage = JsonFileStorage::new(dir.path().join("state.json"));

        storage.save(&record("Pro Plan")).unwrap();
        storage.save(&record("Ultra Plan")).unwrap();

        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded.cursor_data().plan(), Some("Ultra Plan"));
    }

    #[test]
    fn test_load_extension_shaped_record() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let content = r#"{
            "cursorData": {
                "timestamp": "2025-09-25T09:59:58.120Z",
                "url": "https://cursor.com/dashboard",
                "plan": "Pro Plan",
                "onDemandUsage": "Off",
                "dollarAmounts": ["$20.00"],
                "tableData": [[["Date", "Model", "Kind", "Tokens", "Cost"]]],
                "extracted": true
            },
            "lastUpdated": "2025-09-25T10:00:00.000Z"
        }"#;
        temp_file.write_all(content.as_bytes()).unwrap();

        let storage = JsonFileStorage::new(temp_file.path());
        let loaded = storage.load().unwrap().unwrap();

        assert!(loaded.cursor_data().is_extracted());
        assert_eq!(loaded.cursor_data().plan(), Some("Pro Plan"));
        assert_eq!(loaded.cursor_data().table_data().len(), 1);
        assert_eq!(
            loaded.last_updated(),
            Utc.with_ymd_and_hms(2025, 9, 25, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_failed_extension_record_is_not_reported() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let content = r#"{
            "cursorData": {
                "timestamp": "2025-09-25T09:59:58.120Z",
                "extracted": false,
                "error": "Cannot read properties of null"
            },
            "lastUpdated": "2025-09-25T10:00:00.000Z"
        }"#;
        temp_file.write_all(content.as_bytes()).unwrap();

        let loaded = JsonFileStorage::new(temp_file.path()).load().unwrap().unwrap();
        assert!(!loaded.cursor_data().is_extracted());
        assert!(loaded.cursor_data().table_data().is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{"cursorData": "#).unwrap();

        assert!(JsonFileStorage::new(temp_file.path()).load().is_err());
    }

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.save(&record("Free Plan")).unwrap();
        assert_eq!(storage.load().unwrap(), Some(record("Free Plan")));
    }
}
