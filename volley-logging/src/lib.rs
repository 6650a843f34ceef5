//! Structured logging infrastructure for Volley
//!
//! The engine emits `tracing` events; this crate installs the subscriber that
//! renders them according to [`volley_config::LoggingConfig`].

pub mod init;

pub use init::{build_env_filter, init_logging, init_simple_tracing};
pub use volley_config::domains::logging::{LogFormat, LogLevel};
pub use volley_config::LoggingConfig;
