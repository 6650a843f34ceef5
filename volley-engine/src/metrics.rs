//! Request sample collection and aggregation
//!
//! [`MetricsCollector`] is shared by every virtual user. Appends, start and
//! stop take the write lock; aggregations take the read lock or run on a
//! [`MetricsSnapshot`] copied out under it.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// One completed or failed HTTP call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSample {
    pub step_name: String,
    pub duration: Duration,
    /// 0 when no response was obtained
    pub status_code: u16,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl RequestSample {
    pub fn new(
        step_name: impl Into<String>,
        duration: Duration,
        status_code: u16,
        error_message: Option<String>,
    ) -> Self {
        Self {
            step_name: step_name.into(),
            duration,
            status_code,
            success: (200..300).contains(&status_code),
            timestamp: Utc::now(),
            error_message,
        }
    }

    fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

/// Collector lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorPhase {
    Idle,
    Running,
    Stopped,
}

/// Run-wide aggregate statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub error_rate: f64,
    pub requests_per_second: f64,
    pub avg_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub p99_response_time_ms: f64,
    pub min_response_time_ms: f64,
    pub max_response_time_ms: f64,
}

/// Aggregate statistics of one scenario step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub step_name: String,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub error_rate: f64,
    pub avg_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub p99_response_time_ms: f64,
    pub min_response_time_ms: f64,
    pub max_response_time_ms: f64,
}

/// Failure class of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    ClientError,
    ServerError,
    NetworkError,
    Unknown,
}

impl ErrorCategory {
    pub fn classify(sample: &RequestSample) -> Self {
        match sample.status_code {
            400..=499 => ErrorCategory::ClientError,
            500.. => ErrorCategory::ServerError,
            _ if sample.error_message.is_some() => ErrorCategory::NetworkError,
            _ => ErrorCategory::Unknown,
        }
    }
}

/// Failed samples of one (step, category) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub step_name: String,
    pub error_type: ErrorCategory,
    pub count: usize,
    /// Share of all requests, not only failures, as a percentage
    pub percentage: f64,
}

/// Immutable view of the collector state
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub samples: Vec<RequestSample>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub running: bool,
}

impl MetricsSnapshot {
    pub fn phase(&self) -> CollectorPhase {
        match (self.start_time, self.running) {
            (_, true) => CollectorPhase::Running,
            (Some(_), false) => CollectorPhase::Stopped,
            (None, false) => CollectorPhase::Idle,
        }
    }

    /// Collection window: start to now while running, start to stop afterwards
    pub fn elapsed(&self) -> Duration {
        let Some(start) = self.start_time else {
            return Duration::ZERO;
        };
        let end = if self.running {
            Utc::now()
        } else {
            self.end_time.unwrap_or_else(Utc::now)
        };
        (end - start).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn global_metrics(&self) -> GlobalMetrics {
        let stats = Stats::from_samples(self.samples.iter());
        let seconds = self.elapsed().as_secs_f64();

        GlobalMetrics {
            total_requests: stats.total,
            successful_requests: stats.successful,
            failed_requests: stats.total - stats.successful,
            error_rate: stats.error_rate(),
            requests_per_second: if seconds > 0.0 {
                stats.total as f64 / seconds
            } else {
                0.0
            },
            avg_response_time_ms: stats.avg(),
            p95_response_time_ms: percentile(&stats.durations_ms, 0.95),
            p99_response_time_ms: percentile(&stats.durations_ms, 0.99),
            min_response_time_ms: stats.min(),
            max_response_time_ms: stats.max(),
        }
    }

    /// Statistics for one step; zero-valued when the step has no samples
    pub fn step_metrics(&self, step_name: &str) -> StepMetrics {
        let stats = Stats::from_samples(self.samples.iter().filter(|s| s.step_name == step_name));

        StepMetrics {
            step_name: step_name.to_string(),
            total_requests: stats.total,
            successful_requests: stats.successful,
            failed_requests: stats.total - stats.successful,
            error_rate: stats.error_rate(),
            avg_response_time_ms: stats.avg(),
            p95_response_time_ms: percentile(&stats.durations_ms, 0.95),
            p99_response_time_ms: percentile(&stats.durations_ms, 0.99),
            min_response_time_ms: stats.min(),
            max_response_time_ms: stats.max(),
        }
    }

    /// Failures grouped by step and category, ordered by step name
    pub fn error_summary(&self) -> Vec<ErrorSummary> {
        let total = self.samples.len();
        let mut counts: BTreeMap<(&str, ErrorCategory), usize> = BTreeMap::new();

        for sample in self.samples.iter().filter(|s| !s.success) {
            *counts
                .entry((sample.step_name.as_str(), ErrorCategory::classify(sample)))
                .or_default() += 1;
        }

        counts
            .into_iter()
            .map(|((step_name, error_type), count)| ErrorSummary {
                step_name: step_name.to_string(),
                error_type,
                count,
                percentage: count as f64 / total as f64 * 100.0,
            })
            .collect()
    }

    /// Step names in order of first appearance
    pub fn unique_step_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for sample in &self.samples {
            if !names.iter().any(|n| n == &sample.step_name) {
                names.push(sample.step_name.clone());
            }
        }
        names
    }

    /// Metrics of every step that recorded a sample
    pub fn all_step_metrics(&self) -> Vec<StepMetrics> {
        self.unique_step_names()
            .iter()
            .map(|name| self.step_metrics(name))
            .collect()
    }
}

/// Thread-safe sample store shared by all sessions of a run
#[derive(Debug, Default)]
pub struct MetricsCollector {
    state: RwLock<MetricsSnapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear prior samples and open a new collection window
    pub fn start_collection(&self) {
        let mut state = self.state.write();
        state.samples.clear();
        state.start_time = Some(Utc::now());
        state.end_time = None;
        state.running = true;
        debug!("Metrics collection started");
    }

    /// Close the collection window
    pub fn stop_collection(&self) {
        let mut state = self.state.write();
        state.end_time = Some(Utc::now());
        state.running = false;
        debug!("Metrics collection stopped ({} samples)", state.samples.len());
    }

    pub fn add_request(
        &self,
        step_name: &str,
        duration: Duration,
        status_code: u16,
        error_message: Option<String>,
    ) {
        let sample = RequestSample::new(step_name, duration, status_code, error_message);
        self.state.write().samples.push(sample);
    }

    pub fn phase(&self) -> CollectorPhase {
        self.state.read().phase()
    }

    pub fn total_requests(&self) -> usize {
        self.state.read().samples.len()
    }

    /// Live throughput; 0 unless collection is running with samples
    pub fn current_rps(&self) -> f64 {
        let state = self.state.read();
        if !state.running || state.samples.is_empty() {
            return 0.0;
        }
        let seconds = state.elapsed().as_secs_f64();
        if seconds > 0.0 {
            state.samples.len() as f64 / seconds
        } else {
            0.0
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.state.read().clone()
    }

    pub fn global_metrics(&self) -> GlobalMetrics {
        self.state.read().global_metrics()
    }

    pub fn step_metrics(&self, step_name: &str) -> StepMetrics {
        self.state.read().step_metrics(step_name)
    }

    pub fn error_summary(&self) -> Vec<ErrorSummary> {
        self.state.read().error_summary()
    }

    pub fn unique_step_names(&self) -> Vec<String> {
        self.state.read().unique_step_names()
    }
}

/// Linearly interpolated percentile of ascending values
///
/// `p` is a fraction in `[0, 1]`. The rank is `p * (n - 1)`; an integral rank
/// returns that element, otherwise the two neighbours are blended by the
/// fractional part.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }

    let weight = rank - lower as f64;
    sorted[lower] + weight * (sorted[upper] - sorted[lower])
}

struct Stats {
    total: usize,
    successful: usize,
    /// Ascending
    durations_ms: Vec<f64>,
}

impl Stats {
    fn from_samples<'s>(samples: impl Iterator<Item = &'s RequestSample>) -> Self {
        let mut total = 0;
        let mut successful = 0;
        let mut durations_ms = Vec::new();
        for sample in samples {
            total += 1;
            if sample.success {
                successful += 1;
            }
            durations_ms.push(sample.duration_ms());
        }
        durations_ms.sort_by(f64::total_cmp);

        Self {
            total,
            successful,
            durations_ms,
        }
    }

    fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.total - self.successful) as f64 / self.total as f64
        }
    }

    fn avg(&self) -> f64 {
        if self.durations_ms.is_empty() {
            0.0
        } else {
            self.durations_ms.iter().sum::<f64>() / self.durations_ms.len() as f64
        }
    }

    fn min(&self) -> f64 {
        self.durations_ms.first().copied().unwrap_or(0.0)
    }

    fn max(&self) -> f64 {
        self.durations_ms.last().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_percentile_interpolates_between_neighbours() {
        let values = [100.0, 100.0, 100.0, 100.0, 500.0];
        assert!((percentile(&values, 0.95) - 420.0).abs() < 1e-9);
        assert!((percentile(&values, 0.5) - 100.0).abs() < 1e-9);
        assert_eq!(percentile(&values, 1.0), 500.0);
        assert_eq!(percentile(&[], 0.95), 0.0);
        assert_eq!(percentile(&[7.0], 0.99), 7.0);
    }

    #[test]
    fn test_empty_collector_is_zero_valued() {
        let collector = MetricsCollector::new();
        assert_eq!(collector.phase(), CollectorPhase::Idle);
        assert_eq!(collector.global_metrics(), GlobalMetrics::default());
        assert!(collector.error_summary().is_empty());
        assert_eq!(collector.current_rps(), 0.0);

        collector.start_collection();
        collector.stop_collection();
        assert_eq!(collector.global_metrics(), GlobalMetrics::default());
    }

    #[test]
    fn test_global_metrics() {
        let collector = MetricsCollector::new();
        collector.start_collection();
        for d in [100, 100, 100, 100] {
            collector.add_request("list", ms(d), 200, None);
        }
        collector.add_request("list", ms(500), 503, None);
        collector.stop_collection();

        let global = collector.global_metrics();
        assert_eq!(global.total_requests, 5);
        assert_eq!(global.successful_requests, 4);
        assert_eq!(global.failed_requests, 1);
        assert!((global.error_rate - 0.2).abs() < 1e-9);
        assert!((global.avg_response_time_ms - 180.0).abs() < 1e-9);
        assert!((global.p95_response_time_ms - 420.0).abs() < 1e-9);
        assert_eq!(global.min_response_time_ms, 100.0);
        assert_eq!(global.max_response_time_ms, 500.0);
        assert!(global.requests_per_second >= 0.0);
        assert_eq!(collector.phase(), CollectorPhase::Stopped);
    }

    #[test]
    fn test_success_is_2xx_only() {
        assert!(RequestSample::new("s", ms(1), 200, None).success);
        assert!(RequestSample::new("s", ms(1), 299, None).success);
        assert!(!RequestSample::new("s", ms(1), 300, None).success);
        assert!(!RequestSample::new("s", ms(1), 199, None).success);
        assert!(!RequestSample::new("s", ms(1), 0, Some("refused".into())).success);
    }

    #[test]
    fn test_step_metrics_and_names() {
        let collector = MetricsCollector::new();
        collector.start_collection();
        collector.add_request("login", ms(40), 200, None);
        collector.add_request("profile", ms(10), 200, None);
        collector.add_request("login", ms(60), 401, None);

        assert_eq!(collector.unique_step_names(), ["login", "profile"]);

        let login = collector.step_metrics("login");
        assert_eq!(login.total_requests, 2);
        assert_eq!(login.failed_requests, 1);
        assert!((login.error_rate - 0.5).abs() < 1e-9);
        assert!((login.avg_response_time_ms - 50.0).abs() < 1e-9);

        let unknown = collector.step_metrics("logout");
        assert_eq!(unknown.step_name, "logout");
        assert_eq!(unknown.total_requests, 0);
        assert_eq!(unknown.error_rate, 0.0);
    }

    #[test]
    fn test_error_summary_categories() {
        let collector = MetricsCollector::new();
        collector.start_collection();
        collector.add_request("a", ms(1), 200, None);
        collector.add_request("a", ms(1), 404, None);
        collector.add_request("a", ms(1), 404, None);
        collector.add_request("b", ms(1), 502, None);
        collector.add_request("b", ms(1), 0, Some("connection refused".into()));
        collector.add_request("b", ms(1), 0, None);
        collector.add_request("b", ms(1), 302, None);
        collector.add_request("c", ms(1), 200, None);

        let summary = collector.error_summary();
        let rows: Vec<(&str, ErrorCategory, usize)> = summary
            .iter()
            .map(|e| (e.step_name.as_str(), e.error_type, e.count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("a", ErrorCategory::ClientError, 2),
                ("b", ErrorCategory::ServerError, 1),
                ("b", ErrorCategory::NetworkError, 1),
                ("b", ErrorCategory::Unknown, 2),
            ]
        );
        // 2 of 8 requests overall
        assert!((summary[0].percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_category_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorCategory::NetworkError).unwrap(),
            "\"NETWORK_ERROR\""
        );
    }

    #[test]
    fn test_start_clears_previous_run() {
        let collector = MetricsCollector::new();
        collector.start_collection();
        collector.add_request("a", ms(1), 200, None);
        collector.stop_collection();

        collector.start_collection();
        assert_eq!(collector.total_requests(), 0);
        assert_eq!(collector.phase(), CollectorPhase::Running);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let collector = MetricsCollector::new();
        collector.start_collection();
        collector.add_request("a", ms(5), 200, None);

        let snapshot = collector.snapshot();
        collector.add_request("a", ms(5), 200, None);

        assert_eq!(snapshot.samples.len(), 1);
        assert_eq!(collector.total_requests(), 2);
        assert!(snapshot.running);
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let collector = Arc::new(MetricsCollector::new());
        collector.start_collection();

        let threads = 16;
        let per_thread = 500;
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let collector = Arc::clone(&collector);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        let status = if (t + i) % 7 == 0 { 500 } else { 200 };
                        collector.add_request("stress", ms((i % 50) as u64), status, None);
                        if i % 100 == 0 {
                            let _ = collector.global_metrics();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        collector.stop_collection();

        let global = collector.global_metrics();
        assert_eq!(global.total_requests, threads * per_thread);
        assert_eq!(
            global.successful_requests + global.failed_requests,
            threads * per_thread
        );
    }
}
