//! Configuration loading and environment variable handling

use crate::domains::VolleyConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "VOLLEY".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<VolleyConfig> {
        let content = std::fs::read_to_string(path)?;
        self.from_yaml_str(&content)
    }

    /// Load configuration from YAML text with environment overrides
    pub fn from_yaml_str(&self, content: &str) -> ConfigResult<VolleyConfig> {
        let mut config: VolleyConfig = serde_yaml::from_str(content)?;
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<VolleyConfig> {
        let mut config = VolleyConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<VolleyConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut VolleyConfig) -> ConfigResult<()> {
        self.apply_http_overrides(&mut config.http)?;
        self.apply_driver_overrides(&mut config.driver)?;
        self.apply_reports_overrides(&mut config.reports)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("HTTP_TIMEOUT") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_TIMEOUT: {}", e)))?;
            config.timeout = Duration::from_secs(seconds);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(verify_ssl) = self.get_env_var("HTTP_VERIFY_SSL") {
            config.verify_ssl = verify_ssl
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_VERIFY_SSL: {}", e)))?;
        }

        Ok(())
    }

    fn apply_driver_overrides(
        &self,
        config: &mut crate::domains::driver::DriverConfig,
    ) -> ConfigResult<()> {
        if let Ok(duration) = self.get_env_var("DEFAULT_DURATION") {
            let seconds: u64 = duration
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid DEFAULT_DURATION: {}", e)))?;
            config.default_test_duration = Duration::from_secs(seconds);
        }

        if let Ok(pause) = self.get_env_var("ITERATION_PAUSE_MS") {
            let millis: u64 = pause.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid ITERATION_PAUSE_MS: {}", e))
            })?;
            config.iteration_pause = Duration::from_millis(millis);
        }

        Ok(())
    }

    fn apply_reports_overrides(
        &self,
        config: &mut crate::domains::reports::ReportsConfig,
    ) -> ConfigResult<()> {
        if let Ok(dir) = self.get_env_var("REPORTS_DIR") {
            config.directory = dir.into();
        }

        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
