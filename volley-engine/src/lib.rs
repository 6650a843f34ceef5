//! Volley load test engine
//!
//! This crate interprets scenarios (placeholder substitution, ordered steps,
//! response extraction), drives them with concurrent virtual users or a fixed
//! request count, aggregates every request into [`MetricsCollector`] and turns
//! the final state into reports.

pub mod driver;
pub mod error;
pub mod extract;
pub mod input;
pub mod metrics;
pub mod model;
pub mod report;
pub mod runner;
pub mod session;
pub mod store;
pub mod substitution;
pub mod validation;
pub mod worker;

// Re-export main types
pub use driver::{ClientFactory, LoadTestDriver};
pub use error::{EngineError, EngineResult};
pub use extract::{extract, extract_json_path, ExtractionError, ExtractionOutcome, PathError};
pub use input::{load_user_rows, VariablesFile};
pub use metrics::{
    CollectorPhase, ErrorCategory, ErrorSummary, GlobalMetrics, MetricsCollector,
    MetricsSnapshot, RequestSample, StepMetrics,
};
pub use model::{Scenario, Step, TestConfig, TestMode, TestResult, TestStatus, UserRow};
pub use report::{
    analyze_performance, generate_test_report, generate_test_summary, PerformanceAnalysis,
    PerformanceStatus, TestReport, TestSummary,
};
pub use runner::ScenarioRunner;
pub use session::Session;
pub use store::{save_summary, ReportStore, StoreError};
pub use substitution::{substitute, substitute_in_structure, Variables};
pub use validation::{collect_errors, consistency_issues, VariableInventory};
pub use worker::{ExecutionOutcome, ExecutionRequest, ExecutionResponse, LoadTestWorker};
