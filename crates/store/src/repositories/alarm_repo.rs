//! Repository for the alarm-zone list (a single JSON array document).

use std::path::{Path, PathBuf};

use eagleeye_core::alarm::Alarm;

use crate::error::StoreError;

/// Reads and rewrites the persisted alarm list.
///
/// Every write replaces the whole document via a temporary file and a
/// rename, so readers never observe a half-written list.
#[derive(Debug, Clone)]
pub struct AlarmRepo {
    path: PathBuf,
}

impl AlarmRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all alarms.
    ///
    /// A missing file is created holding an empty list; an empty file reads
    /// as no alarms.
    pub fn load(&self) -> Result<Vec<Alarm>, StoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "Alarms file not found, creating an empty one");
            self.save(&[])?;
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| StoreError::json(&self.path, e))
    }

    /// Replace the persisted list with `alarms`.
    pub fn save(&self, alarms: &[Alarm]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }

        let body =
            serde_json::to_string_pretty(alarms).map_err(|e| StoreError::json(&self.path, e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| StoreError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), count = alarms.len(), "Alarms saved");
        Ok(())
    }
}
