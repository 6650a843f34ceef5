//! Runtime input loading

use crate::error::{EngineError, EngineResult};
use crate::model::{Scenario, TestConfig, TestMode, UserRow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Load parameters uploaded alongside a scenario
///
/// Omitted fields take the orchestrator defaults: `users` mode with one
/// virtual user for two minutes, or 100 requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesFile {
    #[serde(default = "default_mode")]
    pub mode: TestMode,
    #[serde(default = "default_virtual_users")]
    pub virtual_users: u32,
    #[serde(default = "default_total_requests")]
    pub total_requests: u32,
    #[serde(default = "default_duration")]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup: Option<String>,
    #[serde(default)]
    pub environment: Map<String, Value>,
}

impl VariablesFile {
    /// Combine with a scenario and user rows into a full test configuration
    pub fn into_test_config(self, scenario: Scenario, users_data: Vec<UserRow>) -> TestConfig {
        TestConfig {
            mode: self.mode,
            virtual_users: self.virtual_users,
            total_requests: self.total_requests,
            duration: Some(self.duration),
            warmup: self.warmup,
            environment: self.environment,
            scenario,
            users_data,
        }
    }
}

fn default_mode() -> TestMode {
    TestMode::Users
}

fn default_virtual_users() -> u32 {
    1
}

fn default_total_requests() -> u32 {
    100
}

fn default_duration() -> String {
    "2m".to_string()
}

/// Parse user-data CSV into rows keyed by the header names
///
/// Headers and cells are trimmed, blank rows are skipped and cells beyond the
/// last header are dropped. Short rows only carry the columns they have.
pub fn load_user_rows(csv_text: &str) -> EngineResult<Vec<UserRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(EngineError::InvalidInput(
            "CSV input has no header row".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: UserRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keyed_by_trimmed_headers() {
        let rows = load_user_rows(" email , password\na@b.com , s3cret\nc@d.com,hunter2\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["email"], "a@b.com");
        assert_eq!(rows[0]["password"], "s3cret");
        assert_eq!(rows[1]["password"], "hunter2");
    }

    #[test]
    fn test_blank_rows_skipped_and_extra_cells_dropped() {
        let rows = load_user_rows("id,name\n1,alice,extra\n , \n2,bob\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1]["name"], "bob");
    }

    #[test]
    fn test_short_rows_keep_available_columns() {
        let rows = load_user_rows("id,name\n3\n").unwrap();
        assert_eq!(rows[0]["id"], "3");
        assert!(!rows[0].contains_key("name"));
    }

    #[test]
    fn test_variables_file_defaults() {
        let vars: VariablesFile = serde_json::from_str(r#"{"environment": {"base": "http://x"}}"#).unwrap();
        assert_eq!(vars.mode, TestMode::Users);
        assert_eq!(vars.virtual_users, 1);
        assert_eq!(vars.total_requests, 100);

        let config = vars.into_test_config(Scenario::new("s", vec![]), Vec::new());
        assert_eq!(config.duration.as_deref(), Some("2m"));
        assert_eq!(config.warmup, None);
        assert_eq!(config.environment["base"], "http://x");
    }

    #[test]
    fn test_missing_header_is_an_error() {
        assert!(matches!(load_user_rows(""), Err(EngineError::InvalidInput(_))));
    }
}
