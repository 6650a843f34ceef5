//! Test configuration and result types
//!
//! [`TestConfig`] arrives fully parsed from the orchestration layer, using the
//! camelCase worker payload shape. It is wrapped in an `Arc` once execution
//! starts and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// One user-data row: column name to cell value
pub type UserRow = HashMap<String, String>;

/// Load generation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    /// Concurrent virtual users looping until the test duration elapses
    Users,
    /// A fixed number of sequential scenario passes
    Requests,
}

impl TestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestMode::Users => "users",
            TestMode::Requests => "requests",
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete configuration of one load test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    pub mode: TestMode,

    /// Concurrency for `users` mode
    #[serde(default)]
    pub virtual_users: u32,

    /// Planned scenario passes for `requests` mode
    #[serde(default)]
    pub total_requests: u32,

    /// Wall-clock bound for `users` mode, e.g. `"2m"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    /// Pause before mode execution, e.g. `"30s"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup: Option<String>,

    /// Values reachable as `{{env.name}}`
    #[serde(default)]
    pub environment: Map<String, Value>,

    pub scenario: Scenario,

    /// Rows reachable as `{{user.column}}`
    #[serde(default)]
    pub users_data: Vec<UserRow>,
}

impl TestConfig {
    /// Configuration for `users` mode
    pub fn users(virtual_users: u32, duration: impl Into<String>, scenario: Scenario) -> Self {
        Self {
            mode: TestMode::Users,
            virtual_users,
            total_requests: 0,
            duration: Some(duration.into()),
            warmup: None,
            environment: Map::new(),
            scenario,
            users_data: Vec::new(),
        }
    }

    /// Configuration for `requests` mode
    pub fn requests(total_requests: u32, scenario: Scenario) -> Self {
        Self {
            mode: TestMode::Requests,
            virtual_users: 0,
            total_requests,
            duration: None,
            warmup: None,
            environment: Map::new(),
            scenario,
            users_data: Vec::new(),
        }
    }

    /// Test duration for `users` mode, falling back to `default` when absent or unparsable
    pub fn test_duration(&self, default: Duration) -> Duration {
        match self.duration.as_deref().map(str::trim) {
            None | Some("") => default,
            Some(text) => parse_duration(text).unwrap_or_else(|e| {
                warn!("Ignoring unparsable duration '{}': {}", text, e);
                default
            }),
        }
    }

    /// Warmup period, if one is configured and non-zero
    pub fn warmup_duration(&self) -> Option<Duration> {
        let text = self.warmup.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        match parse_duration(text) {
            Ok(d) if !d.is_zero() => Some(d),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring unparsable warmup '{}': {}", text, e);
                None
            }
        }
    }
}

/// An ordered HTTP flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

/// One templated HTTP call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub method: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// JSON body template; string leaves may hold placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Variable name to `$.path` expression
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extract: BTreeMap<String, String>,
}

impl Step {
    pub fn new(name: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            extract: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_extract(mut self, variable: impl Into<String>, path: impl Into<String>) -> Self {
        self.extract.insert(variable.into(), path.into());
        self
    }
}

/// Overall outcome of a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Success,
    Failed,
    Timeout,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Success => "success",
            TestStatus::Failed => "failed",
            TestStatus::Timeout => "timeout",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run metadata returned to the orchestration layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub status: TestStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: String,
    #[serde(
        rename = "error_msg",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,
}

/// Parse a duration string such as `"2m"`, `"30s"`, `"1m30s"` or `"500ms"`
pub fn parse_duration(text: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(text.trim())
}

/// Render an elapsed duration at millisecond precision, e.g. `"1s 250ms"`
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = Duration::from_millis(elapsed.as_millis() as u64);
    humantime::format_duration(millis).to_string()
}

/// Default identifier, `test_<unix seconds>`
pub fn generate_test_id() -> String {
    format!("test_{}", Utc::now().timestamp())
}
