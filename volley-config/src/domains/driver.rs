//! Concurrency driver configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings the driver falls back on when a test configuration is silent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Test duration used in users mode when none is given
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_test_duration"
    )]
    pub default_test_duration: Duration,

    /// Pause between two scenario passes of one virtual user
    #[serde(
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_iteration_pause"
    )]
    pub iteration_pause: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            default_test_duration: default_test_duration(),
            iteration_pause: default_iteration_pause(),
        }
    }
}

impl Validatable for DriverConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.default_test_duration.as_millis(),
            "default_test_duration",
            self.domain_name(),
        )?;

        if self.iteration_pause > self.default_test_duration {
            log::warn!(
                "iteration_pause ({:?}) exceeds default_test_duration ({:?})",
                self.iteration_pause,
                self.default_test_duration
            );
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "driver"
    }
}

fn default_test_duration() -> Duration {
    Duration::from_secs(120)
}

fn default_iteration_pause() -> Duration {
    Duration::from_millis(100)
}
