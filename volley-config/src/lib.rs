//! Domain-driven configuration management for Volley
//!
//! Engine settings are split by functional domain, each with validation,
//! defaults and environment variable overrides. The resulting
//! [`VolleyConfig`] is built once and handed to the engine by reference.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    driver::DriverConfig, http::HttpConfig, logging::LoggingConfig, reports::ReportsConfig,
    VolleyConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_millis, serde_duration_option};
