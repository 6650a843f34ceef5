//! Loading of scenario, variables and user-data files

use crate::cli::TestInputs;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use volley_engine::{load_user_rows, Scenario, TestConfig, VariablesFile};

/// Assemble the test configuration described by the input files
pub fn load_test_config(inputs: &TestInputs) -> Result<TestConfig> {
    let scenario: Scenario = read_json(&inputs.scenario, "scenario")?;
    let variables: VariablesFile = read_json(&inputs.variables, "variables")?;

    let users_data = match &inputs.users {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read user data from {:?}", path))?;
            load_user_rows(&text)
                .with_context(|| format!("Failed to parse user data in {:?}", path))?
        }
        None => Vec::new(),
    };

    Ok(variables.into_test_config(scenario, users_data))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {:?}", what, path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid {} JSON in {:?}", what, path))
}
