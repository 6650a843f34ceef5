//! Report persistence configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where and whether test reports are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Directory holding `{test_id}_{timestamp}.json` documents
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Persist a report after every run
    #[serde(default = "crate::domains::utils::default_true")]
    pub save_reports: bool,

    /// Reports older than this are removed by cleanup
    #[serde(
        with = "crate::domains::utils::serde_duration_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub retention: Option<Duration>,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            save_reports: true,
            retention: None,
        }
    }
}

impl Validatable for ReportsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(
            &self.directory.to_string_lossy(),
            "directory",
            self.domain_name(),
        )?;

        if let Some(retention) = self.retention {
            validate_positive(retention.as_secs(), "retention", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "reports"
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("/tmp/loadtest/results")
}
