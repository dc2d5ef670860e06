use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    Success,
    Failed,
}

/// One conversion attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRecord {
    pub timestamp: DateTime<Utc>,
    pub source_format: String,
    pub target_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub status: ConversionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionRecord {
    pub fn success(source_format: &str, target_format: &str, output_path: &Path) -> Self {
        Self {
            timestamp: Utc::now(),
            source_format: source_format.to_string(),
            target_format: target_format.to_string(),
            output_path: Some(output_path.display().to_string()),
            status: ConversionStatus::Success,
            error: None,
        }
    }

    pub fn failed(
        source_format: &str,
        target_format: &str,
        output_path: Option<&Path>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            source_format: source_format.to_string(),
            target_format: target_format.to_string(),
            output_path: output_path.map(|path| path.display().to_string()),
            status: ConversionStatus::Failed,
            error: Some(error.into()),
        }
    }
}

/// Append-only conversion history keyed by resolved document path. Lives
/// as long as the server and is never written to disk.
#[derive(Debug, Default)]
pub struct ConversionTracker {
    history: Mutex<HashMap<PathBuf, Vec<ConversionRecord>>>,
}

impl ConversionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, document: &Path, record: ConversionRecord) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.entry(document.to_path_buf()).or_default().push(record);
    }

    pub fn latest(&self, document: &Path) -> Option<ConversionRecord> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.get(document).and_then(|records| records.last().cloned())
    }

    pub fn history(&self, document: &Path) -> Vec<ConversionRecord> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.get(document).cloned().unwrap_or_default()
    }
}
