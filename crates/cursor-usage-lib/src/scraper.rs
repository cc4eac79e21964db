use crate::data_structures::PageSnapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Access to whatever page the user currently has open.
pub trait ActiveTabScraper {
    /// `Ok(None)` when there is no page to read.
    fn active_page(&self) -> Result<Option<PageSnapshot>>;
}

/// Reads the active page from a JSON snapshot dumped by a browser helper.
pub struct SnapshotFileScraper {
    path: PathBuf,
}

impl SnapshotFileScraper {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActiveTabScraper for SnapshotFileScraper {
    fn active_page(&self) -> Result<Option<PageSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to open file: {}", self.path.display()))?;
        let page = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse page snapshot: {}", self.path.display()))?;

        Ok(Some(page))
    }
}
