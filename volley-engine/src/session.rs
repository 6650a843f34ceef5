//! Per virtual-user execution state

use crate::model::UserRow;
use crate::substitution::Variables;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use volley_http::HttpClient;

/// State owned by exactly one execution unit
///
/// Extracted variables persist across steps and across scenario passes of the
/// same session.
pub struct Session {
    pub id: usize,
    user_data: Arc<UserRow>,
    extracted: HashMap<String, String>,
    client: Box<dyn HttpClient>,
}

impl Session {
    pub fn new(id: usize, user_data: Arc<UserRow>, client: Box<dyn HttpClient>) -> Self {
        Self {
            id,
            user_data,
            extracted: HashMap::new(),
            client,
        }
    }

    /// Pick row `index mod rows`, or an empty row when none were supplied
    pub fn row_for(index: usize, rows: &[Arc<UserRow>]) -> Arc<UserRow> {
        if rows.is_empty() {
            Arc::new(UserRow::new())
        } else {
            Arc::clone(&rows[index % rows.len()])
        }
    }

    pub fn user_data(&self) -> &UserRow {
        &self.user_data
    }

    pub fn extracted(&self) -> &HashMap<String, String> {
        &self.extracted
    }

    pub fn client(&self) -> &dyn HttpClient {
        self.client.as_ref()
    }

    /// Lookup view for substitution
    pub fn variables<'a>(&'a self, environment: &'a Map<String, Value>) -> Variables<'a> {
        Variables::new(&self.user_data, environment, &self.extracted)
    }

    /// Store extracted values, overwriting earlier ones
    pub fn apply_extracted(&mut self, values: impl IntoIterator<Item = (String, String)>) {
        self.extracted.extend(values);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("user_data", &self.user_data)
            .field("extracted", &self.extracted)
            .finish_non_exhaustive()
    }
}
