//! Report and summary generation
//!
//! Everything here is a pure function of the final [`MetricsSnapshot`], the
//! test configuration and the [`TestResult`].

use crate::metrics::{ErrorSummary, GlobalMetrics, MetricsSnapshot, StepMetrics};
use crate::model::{TestConfig, TestMode, TestResult, TestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete, persisted record of one test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub test_id: String,
    pub mode: TestMode,
    pub status: TestStatus,
    pub config: TestConfigSummary,
    pub execution: ExecutionSummary,
    pub global_metrics: GlobalMetrics,
    pub steps_metrics: Vec<StepMetrics>,
    pub errors: Vec<ErrorSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub performance_analysis: PerformanceAnalysis,
}

/// Configuration the run was started with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfigSummary {
    pub mode: TestMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_users: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup: Option<String>,
    pub scenario_name: String,
    pub steps_count: usize,
    pub users_data_count: usize,
}

/// How the run actually went
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub actual_duration: String,
    /// Samples taken during warmup are included in every aggregate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_duration: Option<String>,
    pub requests_completed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_planned: Option<u32>,
    /// `requests` mode only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Condensed view for quick display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub test_id: String,
    pub status: TestStatus,
    pub duration: String,
    pub total_requests: usize,
    /// Percentage, 0 to 100
    pub success_rate: f64,
    pub avg_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub requests_per_second: f64,
    pub error_count: usize,
    pub message: String,
}

/// Advisory classification of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PerformanceStatus::Excellent => "excellent",
            PerformanceStatus::Good => "good",
            PerformanceStatus::Warning => "warning",
            PerformanceStatus::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub overall_status: PerformanceStatus,
    pub recommendations: Vec<String>,
    pub threshold_alerts: Vec<String>,
    pub bottleneck_steps: Vec<String>,
}

const ERROR_RATE_CRITICAL: f64 = 0.10;
const ERROR_RATE_WARNING: f64 = 0.05;
const ERROR_RATE_EXCELLENT: f64 = 0.01;
const P95_CRITICAL_MS: f64 = 1000.0;
const P95_WARNING_MS: f64 = 500.0;
const P95_EXCELLENT_MS: f64 = 300.0;
const BOTTLENECK_FACTOR: f64 = 1.5;

/// Build the full report, performance analysis included
pub fn generate_test_report(
    result: &TestResult,
    config: &TestConfig,
    metrics: &MetricsSnapshot,
) -> TestReport {
    let global_metrics = metrics.global_metrics();
    let steps_metrics = metrics.all_step_metrics();
    let errors = metrics.error_summary();
    let performance_analysis = analyze_performance(&global_metrics, &steps_metrics);

    let config_summary = TestConfigSummary {
        mode: config.mode,
        virtual_users: (config.virtual_users > 0).then_some(config.virtual_users),
        total_requests: (config.total_requests > 0).then_some(config.total_requests),
        duration: config.duration.clone(),
        warmup: config.warmup.clone(),
        scenario_name: config.scenario.name.clone(),
        steps_count: config.scenario.steps.len(),
        users_data_count: config.users_data.len(),
    };

    let planned = (config.mode == TestMode::Requests && config.total_requests > 0)
        .then_some(config.total_requests);

    let execution = ExecutionSummary {
        start_time: result.start_time,
        end_time: result.end_time,
        actual_duration: result.duration.clone(),
        warmup_duration: config.warmup.clone(),
        requests_completed: global_metrics.total_requests,
        requests_planned: planned,
        completion_rate: planned.map(|p| global_metrics.total_requests as f64 / p as f64),
        failure_reason: result.error_message.clone(),
    };

    TestReport {
        test_id: result.test_id.clone(),
        mode: config.mode,
        status: result.status,
        config: config_summary,
        execution,
        global_metrics,
        steps_metrics,
        errors,
        error_message: result.error_message.clone(),
        performance_analysis,
    }
}

/// Build the condensed summary
pub fn generate_test_summary(result: &TestResult, metrics: &MetricsSnapshot) -> TestSummary {
    let global = metrics.global_metrics();
    let success_rate = if global.total_requests > 0 {
        global.successful_requests as f64 / global.total_requests as f64 * 100.0
    } else {
        0.0
    };

    TestSummary {
        test_id: result.test_id.clone(),
        status: result.status,
        duration: result.duration.clone(),
        total_requests: global.total_requests,
        success_rate,
        avg_response_time_ms: global.avg_response_time_ms,
        p95_response_time_ms: global.p95_response_time_ms,
        requests_per_second: global.requests_per_second,
        error_count: global.failed_requests,
        message: status_message(result.status, &global),
    }
}

/// Human-readable one-liner for a finished run
pub fn status_message(status: TestStatus, metrics: &GlobalMetrics) -> String {
    match status {
        TestStatus::Success if metrics.error_rate > ERROR_RATE_WARNING => format!(
            "Test completed with {} errors ({:.1}%)",
            metrics.failed_requests,
            metrics.error_rate * 100.0
        ),
        TestStatus::Success if metrics.p95_response_time_ms > P95_WARNING_MS => format!(
            "Test completed but performance is degraded (P95: {:.0}ms)",
            metrics.p95_response_time_ms
        ),
        TestStatus::Success => format!(
            "Test completed successfully - {} requests, {:.1} RPS",
            metrics.total_requests, metrics.requests_per_second
        ),
        TestStatus::Failed => "Test failed - see error details".to_string(),
        TestStatus::Timeout => "Test interrupted by timeout".to_string(),
    }
}

/// Classify the run against the error-rate and latency thresholds
pub fn analyze_performance(global: &GlobalMetrics, steps: &[StepMetrics]) -> PerformanceAnalysis {
    let error_rate = global.error_rate;
    let p95 = global.p95_response_time_ms;

    let mut recommendations = Vec::new();
    let mut threshold_alerts = Vec::new();

    if error_rate > ERROR_RATE_CRITICAL {
        threshold_alerts.push(format!(
            "Critical error rate: {:.1}% (threshold: 10%)",
            error_rate * 100.0
        ));
        recommendations.push("Reduce load or fix server errors".to_string());
    } else if error_rate > ERROR_RATE_WARNING {
        threshold_alerts.push(format!(
            "High error rate: {:.1}% (threshold: 5%)",
            error_rate * 100.0
        ));
    }

    if p95 > P95_CRITICAL_MS {
        threshold_alerts.push(format!("Critical P95: {:.0}ms (threshold: 1000ms)", p95));
        recommendations.push("Optimise server-side performance".to_string());
    } else if p95 > P95_WARNING_MS {
        threshold_alerts.push(format!("High P95: {:.0}ms (threshold: 500ms)", p95));
    }

    let bottleneck_steps: Vec<String> = steps
        .iter()
        .filter(|step| step.p95_response_time_ms > p95 * BOTTLENECK_FACTOR)
        .map(|step| step.step_name.clone())
        .collect();
    if !bottleneck_steps.is_empty() {
        recommendations.push("Optimise the steps identified as bottlenecks".to_string());
    }

    let overall_status = if error_rate > ERROR_RATE_CRITICAL || p95 > P95_CRITICAL_MS {
        PerformanceStatus::Critical
    } else if error_rate > ERROR_RATE_WARNING || p95 > P95_WARNING_MS {
        PerformanceStatus::Warning
    } else if error_rate < ERROR_RATE_EXCELLENT && p95 < P95_EXCELLENT_MS {
        PerformanceStatus::Excellent
    } else {
        PerformanceStatus::Good
    };

    PerformanceAnalysis {
        overall_status,
        recommendations,
        threshold_alerts,
        bottleneck_steps,
    }
}
