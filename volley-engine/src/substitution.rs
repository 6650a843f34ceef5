//! `{{...}}` placeholder resolution
//!
//! Three namespaces are consulted: `user.` names resolve against the session's
//! user-data row, `env.` names against the environment mapping, and anything
//! else against the session's extracted variables. Unresolved placeholders are
//! left in the output verbatim.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern is valid"));

/// Where a placeholder name resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace<'n> {
    User(&'n str),
    Env(&'n str),
    Extracted(&'n str),
}

impl<'n> Namespace<'n> {
    /// Classify a placeholder name by its prefix
    pub fn classify(name: &'n str) -> Self {
        if let Some(rest) = name.strip_prefix("user.") {
            Namespace::User(rest)
        } else if let Some(rest) = name.strip_prefix("env.") {
            Namespace::Env(rest)
        } else {
            Namespace::Extracted(name)
        }
    }
}

/// Variable sources visible to one session
#[derive(Debug, Clone, Copy)]
pub struct Variables<'a> {
    pub user: &'a HashMap<String, String>,
    pub environment: &'a Map<String, Value>,
    pub extracted: &'a HashMap<String, String>,
}

impl<'a> Variables<'a> {
    pub fn new(
        user: &'a HashMap<String, String>,
        environment: &'a Map<String, Value>,
        extracted: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            user,
            environment,
            extracted,
        }
    }

    /// Resolve one placeholder name, `None` when the namespace has no entry
    pub fn resolve(&self, name: &str) -> Option<String> {
        match Namespace::classify(name) {
            Namespace::User(column) => self.user.get(column).cloned(),
            Namespace::Env(key) => self.environment.get(key).map(value_to_string),
            Namespace::Extracted(var) => self.extracted.get(var).cloned(),
        }
    }
}

/// Replace every resolvable placeholder in `text`
pub fn substitute(text: &str, vars: &Variables<'_>) -> String {
    if !text.contains("{{") {
        return text.to_string();
    }

    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            vars.resolve(caps[1].trim())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Apply [`substitute`] to every string leaf of a JSON value
///
/// Objects keep their key order and arrays their element order. Numbers,
/// booleans and nulls pass through untouched.
pub fn substitute_in_structure(value: &Value, vars: &Variables<'_>) -> Value {
    match value {
        Value::String(s) => Value::String(substitute(s, vars)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_in_structure(item, vars))
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), substitute_in_structure(v, vars)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Placeholder names referenced by `text`, trimmed, in order of appearance
pub fn placeholders(text: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
}

/// Canonical string form of a JSON value
///
/// Strings are used as-is; containers render as compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixture {
        user: HashMap<String, String>,
        env: Map<String, Value>,
        extracted: HashMap<String, String>,
    }

    impl Fixture {
        fn new() -> Self {
            let user = HashMap::from([("email".to_string(), "a@b.com".to_string())]);
            let env = json!({"base_url": "http://api.local", "port": 8080, "debug": true})
                .as_object()
                .cloned()
                .unwrap();
            let extracted = HashMap::from([("token".to_string(), "xyz".to_string())]);
            Self {
                user,
                env,
                extracted,
            }
        }

        fn vars(&self) -> Variables<'_> {
            Variables::new(&self.user, &self.env, &self.extracted)
        }
    }

    #[test]
    fn test_resolves_each_namespace() {
        let fixture = Fixture::new();
        let vars = fixture.vars();

        assert_eq!(substitute("{{user.email}}", &vars), "a@b.com");
        assert_eq!(
            substitute("{{env.base_url}}:{{env.port}}/login", &vars),
            "http://api.local:8080/login"
        );
        assert_eq!(substitute("Bearer {{token}}", &vars), "Bearer xyz");
        assert_eq!(substitute("{{env.debug}}", &vars), "true");
    }

    #[test]
    fn test_unresolved_placeholder_is_left_verbatim() {
        let fixture = Fixture::new();
        let vars = fixture.vars();

        assert_eq!(substitute("{{user.missing}}", &vars), "{{user.missing}}");
        assert_eq!(substitute("{{env.token}}", &vars), "{{env.token}}");
        assert_eq!(
            substitute("{{session_id}}-{{user.email}}", &vars),
            "{{session_id}}-a@b.com"
        );
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let fixture = Fixture::new();
        let vars = fixture.vars();

        for text in ["", "plain", "{single}", "{{", "}}{{", "{{}}"] {
            assert_eq!(substitute(text, &vars), text);
        }
    }

    #[test]
    fn test_placeholder_names_are_trimmed() {
        let fixture = Fixture::new();
        assert_eq!(substitute("{{ user.email }}", &fixture.vars()), "a@b.com");
    }

    #[test]
    fn test_substitute_in_structure_keeps_shape() {
        let fixture = Fixture::new();
        let body = json!({
            "zeta": "{{user.email}}",
            "alpha": {"token": "{{token}}", "retries": 3, "enabled": false},
            "tags": ["{{env.base_url}}", 1, null]
        });

        let out = substitute_in_structure(&body, &fixture.vars());
        assert_eq!(
            out,
            json!({
                "zeta": "a@b.com",
                "alpha": {"token": "xyz", "retries": 3, "enabled": false},
                "tags": ["http://api.local", 1, null]
            })
        );

        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "tags"]);
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("s")), "s");
        assert_eq!(value_to_string(&json!(1.5)), "1.5");
        assert_eq!(value_to_string(&json!(null)), "null");
        assert_eq!(value_to_string(&json!([1, 2])), "[1,2]");
        assert_eq!(value_to_string(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_placeholders_lists_names_in_order() {
        let names: Vec<&str> = placeholders("{{env.base}}/{{ user.id }}/{{token}}").collect();
        assert_eq!(names, ["env.base", "user.id", "token"]);
    }
}
