//! Report persistence
//!
//! Reports are indented JSON documents named `{test_id}_{YYYYmmdd_HHMMSS}.json`
//! inside one directory.

use crate::report::{TestReport, TestSummary};
use chrono::Utc;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Filesystem error during {operation} of {path}: {source}")]
    Filesystem {
        path: String,
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error for {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn fs(path: &Path, operation: &'static str, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.display().to_string(),
            operation,
            source,
        }
    }
}

/// Directory of persisted test reports
#[derive(Debug, Clone)]
pub struct ReportStore {
    directory: PathBuf,
}

impl ReportStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write `report` and return the path of the new file
    pub async fn save(&self, report: &TestReport) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| StoreError::fs(&self.directory, "create_dir", e))?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self
            .directory
            .join(format!("{}_{}.json", report.test_id, timestamp));

        write_json(&path, report).await?;
        info!("Report saved to {}", path.display());
        Ok(path)
    }

    /// Read a report back; relative paths resolve inside the store directory
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<TestReport, StoreError> {
        let path = self.resolve(path.as_ref()).await;
        let data = fs::read(&path)
            .await
            .map_err(|e| StoreError::fs(&path, "read", e))?;

        serde_json::from_slice(&data).map_err(|source| StoreError::Serialization {
            path: path.display().to_string(),
            source,
        })
    }

    /// File names of stored reports, sorted; empty if the directory is missing
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::fs(&self.directory, "read_dir", e)),
        };

        let mut reports = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::fs(&self.directory, "read_dir", e))?
        {
            let path = entry.path();
            if is_report(&path) && entry.file_type().await.is_ok_and(|t| t.is_file()) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    reports.push(name.to_string());
                }
            }
        }

        reports.sort();
        Ok(reports)
    }

    /// Delete reports last modified more than `max_age` ago
    ///
    /// Files that cannot be inspected or removed are logged and skipped.
    /// Returns the number of files removed.
    pub async fn cleanup(&self, max_age: Duration) -> Result<usize, StoreError> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut entries = fs::read_dir(&self.directory)
            .await
            .map_err(|e| StoreError::fs(&self.directory, "read_dir", e))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::fs(&self.directory, "read_dir", e))?
        {
            let path = entry.path();
            if !is_report(&path) {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| {
                if m.is_file() {
                    m.modified().map(Some)
                } else {
                    Ok(None)
                }
            }) {
                Ok(Some(modified)) => modified,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if modified < cutoff {
                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("Could not remove {}: {}", path.display(), e),
                }
            }
        }

        info!(
            "Removed {} report(s) older than {}",
            removed,
            humantime::format_duration(max_age)
        );
        Ok(removed)
    }

    async fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || fs::try_exists(path).await.unwrap_or(false) {
            path.to_path_buf()
        } else {
            self.directory.join(path)
        }
    }
}

/// Write the condensed summary to an explicit path
pub async fn save_summary(summary: &TestSummary, path: impl AsRef<Path>) -> Result<(), StoreError> {
    write_json(path.as_ref(), summary).await
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let data = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialization {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, data)
        .await
        .map_err(|e| StoreError::fs(path, "write", e))
}

fn is_report(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}
