//! Pre-flight validation of test configurations
//!
//! The driver assumes a configuration that already passed these checks.

use crate::model::{parse_duration, Scenario, Step, TestConfig, TestMode};
use crate::substitution::{placeholders, Namespace};
use volley_config::validation::{validate_enum_choice, validate_positive, validate_required_string};
use volley_config::{ConfigResult, Validatable};

/// Methods a scenario step may declare
pub const SUPPORTED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

impl Validatable for TestConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.mode {
            TestMode::Users => {
                validate_positive(self.virtual_users, "virtualUsers", self.domain_name())?
            }
            TestMode::Requests => {
                validate_positive(self.total_requests, "totalRequests", self.domain_name())?
            }
        }

        for (field, value) in [("duration", &self.duration), ("warmup", &self.warmup)] {
            if let Some(text) = value.as_deref() {
                parse_duration(text).map_err(|e| {
                    self.validation_error(format!("{} '{}' is not a valid duration: {}", field, text, e))
                })?;
            }
        }

        self.scenario.validate()
    }

    fn domain_name(&self) -> &'static str {
        "test"
    }
}

impl Validatable for Scenario {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.name, "name", self.domain_name())?;
        if self.steps.is_empty() {
            return Err(self.validation_error(format!(
                "scenario '{}' must contain at least one step",
                self.name
            )));
        }

        for step in &self.steps {
            step.validate()?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scenario"
    }
}

impl Validatable for Step {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.name, "name", self.domain_name())?;
        validate_required_string(&self.url, &format!("{}.url", self.name), self.domain_name())?;
        validate_enum_choice(
            self.method.trim(),
            &SUPPORTED_METHODS,
            &format!("{}.method", self.name),
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "step"
    }
}

/// Every validation error of a configuration, not just the first
pub fn collect_errors(config: &TestConfig) -> Vec<String> {
    let mut errors = Vec::new();

    let count_check = match config.mode {
        TestMode::Users => validate_positive(config.virtual_users, "virtualUsers", "test"),
        TestMode::Requests => validate_positive(config.total_requests, "totalRequests", "test"),
    };
    if let Err(e) = count_check {
        errors.push(e.to_string());
    }

    for (field, value) in [("duration", &config.duration), ("warmup", &config.warmup)] {
        if let Some(text) = value.as_deref() {
            if let Err(e) = parse_duration(text) {
                errors.push(format!("{} '{}' is not a valid duration: {}", field, text, e));
            }
        }
    }

    let scenario = &config.scenario;
    if let Err(e) = validate_required_string(&scenario.name, "name", "scenario") {
        errors.push(e.to_string());
    }
    if scenario.steps.is_empty() {
        errors.push("scenario must contain at least one step".to_string());
    }
    for (index, step) in scenario.steps.iter().enumerate() {
        if let Err(e) = step.validate() {
            errors.push(format!("step {}: {}", index + 1, e));
        }
    }

    errors
}

/// Placeholders that cannot resolve against the supplied inputs
///
/// Reports `{{user.x}}` references when the user rows lack column `x` and
/// `{{env.x}}` references when the environment lacks key `x`.
pub fn consistency_issues(config: &TestConfig) -> Vec<String> {
    let inventory = VariableInventory::from_scenario(&config.scenario);
    let mut issues = Vec::new();

    if !inventory.user.is_empty() {
        if config.users_data.is_empty() {
            issues.push(format!(
                "scenario references user variables ({}) but no user data was supplied",
                inventory.user.join(", ")
            ));
        } else {
            for column in &inventory.user {
                if !config.users_data.iter().any(|row| row.contains_key(column)) {
                    issues.push(format!("user data has no column '{}'", column));
                }
            }
        }
    }

    for key in &inventory.env {
        if !config.environment.contains_key(key) {
            issues.push(format!("environment has no key '{}'", key));
        }
    }

    issues
}

/// Placeholders referenced by a scenario, grouped by namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableInventory {
    pub user: Vec<String>,
    pub env: Vec<String>,
    pub extracted: Vec<String>,
}

impl VariableInventory {
    /// Scan URLs, header values and body strings in step order
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let mut inventory = Self::default();
        for step in &scenario.steps {
            inventory.scan(&step.url);
            for value in step.headers.values() {
                inventory.scan(value);
            }
            if let Some(body) = &step.body {
                inventory.scan_value(body);
            }
        }
        inventory
    }

    fn scan_value(&mut self, value: &serde_json::Value) {
        match value {
            serde_json::Value::String(s) => self.scan(s),
            serde_json::Value::Array(items) => items.iter().for_each(|v| self.scan_value(v)),
            serde_json::Value::Object(fields) => fields.values().for_each(|v| self.scan_value(v)),
            _ => {}
        }
    }

    fn scan(&mut self, text: &str) {
        for name in placeholders(text) {
            let (list, key) = match Namespace::classify(name) {
                Namespace::User(key) => (&mut self.user, key),
                Namespace::Env(key) => (&mut self.env, key),
                Namespace::Extracted(key) => (&mut self.extracted, key),
            };
            if !list.iter().any(|existing| existing == key) {
                list.push(key.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserRow;
    use serde_json::json;

    fn step() -> Step {
        Step::new("login", "post", "{{env.base}}/login")
    }

    #[test]
    fn test_valid_config_passes() {
        let config = TestConfig::users(5, "2m", Scenario::new("flow", vec![step()]));
        assert!(config.validate().is_ok());
        assert!(collect_errors(&config).is_empty());
    }

    #[test]
    fn test_mode_requires_positive_count() {
        let config = TestConfig::users(0, "1m", Scenario::new("flow", vec![step()]));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("virtualUsers"));

        let config = TestConfig::requests(0, Scenario::new("flow", vec![step()]));
        assert!(config.validate().unwrap_err().to_string().contains("totalRequests"));
    }

    #[test]
    fn test_scenario_and_step_checks() {
        assert!(Scenario::new("flow", vec![]).validate().is_err());
        assert!(Scenario::new(" ", vec![step()]).validate().is_err());
        assert!(Step::new("", "GET", "http://x").validate().is_err());
        assert!(Step::new("a", "GET", "").validate().is_err());
        assert!(Step::new("a", "HEAD", "http://x").validate().is_err());
        assert!(Step::new("a", "Patch", "http://x").validate().is_ok());
    }

    #[test]
    fn test_unparsable_duration_is_rejected() {
        let mut config = TestConfig::users(1, "two minutes", Scenario::new("flow", vec![step()]));
        assert!(config.validate().is_err());

        config.duration = Some("1m30s".to_string());
        config.warmup = Some("later".to_string());
        assert!(config.validate().unwrap_err().to_string().contains("warmup"));
    }

    #[test]
    fn test_collect_errors_reports_everything() {
        let mut config = TestConfig::requests(
            0,
            Scenario::new("", vec![Step::new("a", "BREW", ""), Step::new("b", "GET", "http://x")]),
        );
        config.warmup = Some("soon".into());

        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors[3].starts_with("step 1:"));
    }

    #[test]
    fn test_inventory_groups_and_deduplicates() {
        let steps = vec![
            Step::new("login", "POST", "{{env.base}}/login")
                .with_body(json!({"email": "{{user.email}}", "nested": ["{{user.password}}"]})),
            Step::new("me", "GET", "{{env.base}}/users/{{user_id}}")
                .with_header("Authorization", "Bearer {{token}}"),
        ];
        let inventory = VariableInventory::from_scenario(&Scenario::new("flow", steps));

        assert_eq!(inventory.env, ["base"]);
        assert_eq!(inventory.user, ["email", "password"]);
        assert_eq!(inventory.extracted, ["user_id", "token"]);
    }

    #[test]
    fn test_consistency_issues() {
        let steps = vec![Step::new("a", "GET", "{{env.base}}/{{env.tenant}}?u={{user.email}}")];
        let mut config = TestConfig::requests(1, Scenario::new("flow", steps));
        config.environment = json!({"base": "http://x"}).as_object().cloned().unwrap();

        let issues = consistency_issues(&config);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("no user data"));
        assert!(issues[1].contains("'tenant'"));

        config.users_data = vec![UserRow::from([("name".to_string(), "n".to_string())])];
        let issues = consistency_issues(&config);
        assert!(issues[0].contains("no column 'email'"));
    }
}
