//! Scenario interpreter
//!
//! One pass runs every step of the scenario in declared order against a
//! single session. Each step records exactly one sample, whatever the outcome.

use crate::error::{EngineError, EngineResult};
use crate::extract::extract;
use crate::metrics::MetricsCollector;
use crate::model::{Step, TestConfig};
use crate::session::Session;
use crate::substitution::{substitute, substitute_in_structure};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use volley_http::{HttpMethod, HttpRequest};

/// Runs scenario passes for the sessions of one test
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    config: Arc<TestConfig>,
    collector: Arc<MetricsCollector>,
}

impl ScenarioRunner {
    pub fn new(config: Arc<TestConfig>, collector: Arc<MetricsCollector>) -> Self {
        Self { config, collector }
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Execute one pass of the scenario
    ///
    /// The first failing step ends the pass and its error is returned. The
    /// session stays usable for the next pass.
    pub async fn run_once(&self, session: &mut Session) -> EngineResult<()> {
        for step in &self.config.scenario.steps {
            self.run_step(step, session).await?;
        }
        Ok(())
    }

    /// Execute a single step and record its sample
    pub async fn run_step(&self, step: &Step, session: &mut Session) -> EngineResult<()> {
        // timed from step start, so pre-flight failures carry their real cost
        let started = Instant::now();
        let request = match self.build_request(step, session) {
            Ok(request) => request,
            Err(e) => {
                self.collector
                    .add_request(&step.name, started.elapsed(), 0, Some(e.to_string()));
                return Err(e);
            }
        };

        debug!(
            "Session {} executing step '{}': {} {}",
            session.id, step.name, request.method, request.url
        );

        let result = session.client().execute(&request).await;
        let elapsed = started.elapsed();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.collector.add_request(
                    &step.name,
                    elapsed,
                    e.status_code(),
                    Some(e.to_string()),
                );
                return Err(EngineError::StepFailed {
                    step: step.name.clone(),
                    source: e,
                });
            }
        };

        self.collector
            .add_request(&step.name, elapsed, response.status, None);
        debug!(
            "Step '{}' answered {} in {}ms",
            step.name,
            response.status,
            elapsed.as_millis()
        );

        if !step.extract.is_empty() {
            match extract(&step.extract, &response.body) {
                Ok(outcome) => {
                    for (variable, err) in &outcome.failures {
                        warn!(
                            "Step '{}' could not extract '{}': {}",
                            step.name, variable, err
                        );
                    }
                    session.apply_extracted(outcome.applied);
                }
                Err(e) => warn!("Step '{}' extraction skipped: {}", step.name, e),
            }
        }

        Ok(())
    }

    fn build_request(&self, step: &Step, session: &Session) -> EngineResult<HttpRequest> {
        let vars = session.variables(&self.config.environment);

        let method: HttpMethod = step.method.parse().map_err(|e| EngineError::StepFailed {
            step: step.name.clone(),
            source: volley_http::HttpError::from(e),
        })?;

        let mut request = HttpRequest::new(method, substitute(&step.url, &vars));
        for (name, value) in &step.headers {
            request = request.with_header(name.clone(), substitute(value, &vars));
        }

        if let Some(body) = &step.body {
            let rendered = substitute_in_structure(body, &vars);
            let bytes =
                serde_json::to_vec(&rendered).map_err(|source| EngineError::BodyEncoding {
                    step: step.name.clone(),
                    source,
                })?;
            request = request.with_body(bytes);
        }

        Ok(request)
    }
}
