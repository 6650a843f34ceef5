//! HTTP client functionality for Volley
//!
//! Every virtual user owns one [`HttpManager`]: a reqwest client built once
//! with the configured timeout and reused for all of that user's calls.
//! The [`HttpClient`] trait is the seam the scenario runner talks to.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpClient, HttpManager};
pub use config::HttpConfig;
pub use errors::HttpError;
pub use types::{HttpMethod, HttpMethodError, HttpRequest, HttpResponse};
