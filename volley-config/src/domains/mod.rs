//! Domain-specific configuration modules

pub mod driver;
pub mod http;
pub mod logging;
pub mod reports;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Volley configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VolleyConfig {
    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Concurrency driver configuration
    #[serde(default)]
    pub driver: driver::DriverConfig,

    /// Report persistence configuration
    #[serde(default)]
    pub reports: reports::ReportsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl VolleyConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.http.validate()?;
        self.driver.validate()?;
        self.reports.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = VolleyConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
