//! Execution entry point used by the orchestration boundary
//!
//! A [`LoadTestWorker`] turns one [`ExecutionRequest`] into one
//! [`ExecutionResponse`]: validate, drive the test, build the report and
//! summary, persist the report.

use crate::driver::{ClientFactory, LoadTestDriver};
use crate::metrics::MetricsCollector;
use crate::model::{generate_test_id, TestConfig, TestStatus};
use crate::report::{generate_test_report, generate_test_summary, TestReport, TestSummary};
use crate::store::ReportStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use volley_config::{Validatable, VolleyConfig};
use volley_http::HttpConfig;

/// Request sent by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    pub config: TestConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ExecutionRequest {
    pub fn new(config: TestConfig) -> Self {
        Self {
            test_id: None,
            config,
            timestamp: Some(Utc::now()),
        }
    }

    pub fn with_test_id(mut self, test_id: impl Into<String>) -> Self {
        self.test_id = Some(test_id.into());
        self
    }
}

/// Reply returned to the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub status: TestStatus,
    pub test_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<TestSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// Everything produced by one run
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub response: ExecutionResponse,
    /// Absent when the configuration was rejected before execution
    pub report: Option<TestReport>,
}

/// Runs tests with engine settings fixed at construction
pub struct LoadTestWorker {
    settings: VolleyConfig,
    store: ReportStore,
    client_factory: Option<ClientFactory>,
}

impl LoadTestWorker {
    pub fn new(settings: VolleyConfig) -> Self {
        let store = ReportStore::new(settings.reports.directory.clone());
        Self {
            settings,
            store,
            client_factory: None,
        }
    }

    /// Replace the reqwest-backed clients, e.g. with scripted ones
    pub fn with_client_factory(mut self, factory: ClientFactory) -> Self {
        self.client_factory = Some(factory);
        self
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResponse {
        self.run(request).await.response
    }

    /// Execute a request and keep the generated report
    pub async fn run(&self, request: ExecutionRequest) -> ExecutionOutcome {
        let test_id = request
            .test_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generate_test_id);

        if let Err(e) = request.config.validate() {
            error!("Rejecting test {}: {}", test_id, e);
            return ExecutionOutcome {
                response: ExecutionResponse {
                    status: TestStatus::Failed,
                    test_id,
                    message: "Invalid test configuration".to_string(),
                    summary: None,
                    report_path: None,
                    error: Some(e.to_string()),
                    duration: None,
                },
                report: None,
            };
        }

        let config = Arc::new(request.config);
        let collector = Arc::new(MetricsCollector::new());
        let driver = match &self.client_factory {
            Some(factory) => LoadTestDriver::with_client_factory(
                self.settings.driver.clone(),
                Arc::clone(&collector),
                Arc::clone(factory),
            ),
            None => LoadTestDriver::new(
                HttpConfig::from(self.settings.http.clone()),
                self.settings.driver.clone(),
                Arc::clone(&collector),
            ),
        };

        let result = driver.execute_test(Arc::clone(&config), &test_id).await;

        let snapshot = collector.snapshot();
        let report = generate_test_report(&result, &config, &snapshot);
        let summary = generate_test_summary(&result, &snapshot);

        let report_path = if self.settings.reports.save_reports {
            match self.store.save(&report).await {
                Ok(path) => Some(path.display().to_string()),
                Err(e) => {
                    warn!("Could not save report for {}: {}", test_id, e);
                    None
                }
            }
        } else {
            None
        };

        info!("Test {}: {}", test_id, summary.message);

        ExecutionOutcome {
            response: ExecutionResponse {
                status: result.status,
                test_id,
                message: summary.message.clone(),
                summary: Some(summary),
                report_path,
                error: result.error_message,
                duration: Some(result.duration),
            },
            report: Some(report),
        }
    }
}
