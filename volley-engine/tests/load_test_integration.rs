//! End-to-end tests against a mock HTTP target

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use volley_config::{DriverConfig, VolleyConfig};
use volley_engine::{
    ErrorCategory, ExecutionRequest, LoadTestDriver, LoadTestWorker, MetricsCollector, Scenario,
    Step, TestConfig, TestStatus,
};
use volley_http::HttpConfig;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn driver(collector: Arc<MetricsCollector>) -> LoadTestDriver {
    let http = HttpConfig {
        timeout: Duration::from_secs(2),
        ..HttpConfig::default()
    };
    LoadTestDriver::new(http, DriverConfig::default(), collector)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_users_mode_terminates_after_duration() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(20)))
        .mount(&mock_server)
        .await;

    let scenario = Scenario::new(
        "health",
        vec![Step::new("health", "GET", format!("{}/health", mock_server.uri()))],
    );
    let config = Arc::new(TestConfig::users(5, "1s", scenario));
    let collector = Arc::new(MetricsCollector::new());

    let started = Instant::now();
    let result = driver(Arc::clone(&collector))
        .execute_test(config, "test_users")
        .await;
    let elapsed = started.elapsed();

    assert_eq!(result.status, TestStatus::Success);
    assert!(elapsed >= Duration::from_secs(1), "stopped early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1800), "overran: {elapsed:?}");

    let global = collector.global_metrics();
    assert!(global.total_requests >= 5, "every user ran at least once");
    assert_eq!(global.failed_requests, 0);

    // all virtual users are joined: nothing is recorded after return
    let recorded = collector.total_requests();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(collector.total_requests(), recorded);
}

#[tokio::test]
async fn test_requests_mode_records_every_failed_call() {
    // nothing listens on port 1
    let scenario = Scenario::new(
        "unreachable",
        vec![Step::new("ping", "GET", "http://127.0.0.1:1/ping")],
    );
    let config = Arc::new(TestConfig::requests(20, scenario));
    let collector = Arc::new(MetricsCollector::new());

    let result = driver(Arc::clone(&collector))
        .execute_test(config, "test_unreachable")
        .await;

    assert_eq!(result.status, TestStatus::Success);
    assert!(result.error_message.is_none());

    let global = collector.global_metrics();
    assert_eq!(global.total_requests, 20);
    assert_eq!(global.failed_requests, 20);
    assert_eq!(global.error_rate, 1.0);

    let errors = collector.error_summary();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_type, ErrorCategory::NetworkError);
    assert!((errors[0].percentage - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_extracted_token_is_sent_by_later_steps() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"email": "a@b.com", "password": "s3cret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"token": "xyz", "id": 7}})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/7"))
        .and(header("authorization", "Bearer xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(3)
        .mount(&mock_server)
        .await;

    let steps = vec![
        Step::new("login", "POST", "{{env.base_url}}/login")
            .with_body(json!({"email": "{{user.email}}", "password": "{{user.password}}"}))
            .with_extract("token", "$.data.token")
            .with_extract("user_id", "$.data.id"),
        Step::new("profile", "GET", "{{env.base_url}}/users/{{user_id}}")
            .with_header("Authorization", "Bearer {{token}}"),
    ];
    let mut config = TestConfig::requests(3, Scenario::new("login flow", steps));
    config.environment = json!({"base_url": mock_server.uri()})
        .as_object()
        .cloned()
        .unwrap();
    config.users_data = volley_engine::load_user_rows("email,password\na@b.com,s3cret\n").unwrap();

    let collector = Arc::new(MetricsCollector::new());
    let result = driver(Arc::clone(&collector))
        .execute_test(Arc::new(config), "test_flow")
        .await;

    assert_eq!(result.status, TestStatus::Success);
    let profile = collector.step_metrics("profile");
    assert_eq!(profile.total_requests, 3);
    assert_eq!(profile.successful_requests, 3);
    assert_eq!(collector.unique_step_names(), ["login", "profile"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_add_request_loses_nothing() {
    let collector = Arc::new(MetricsCollector::new());
    collector.start_collection();

    let tasks = 64usize;
    let handles: Vec<_> = (0..tasks)
        .map(|t| {
            let collector = Arc::clone(&collector);
            tokio::spawn(async move {
                // uneven workloads so tasks interleave differently
                let n = 50 + (t * 37) % 101;
                for i in 0..n {
                    let status = if (t * 31 + i) % 5 == 0 { 503 } else { 200 };
                    collector.add_request(
                        &format!("step-{}", t % 4),
                        Duration::from_micros(((t * 7919 + i * 104_729) % 50_000) as u64),
                        status,
                        None,
                    );
                    if i % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
                n
            })
        })
        .collect();

    let mut expected = 0;
    for joined in futures::future::join_all(handles).await {
        expected += joined.unwrap();
    }
    collector.stop_collection();

    let global = collector.global_metrics();
    assert_eq!(global.total_requests, expected);
    assert_eq!(global.successful_requests + global.failed_requests, expected);

    let per_step: usize = collector
        .unique_step_names()
        .iter()
        .map(|name| collector.step_metrics(name).total_requests)
        .sum();
    assert_eq!(per_step, expected);
}

#[tokio::test]
async fn test_saved_report_reloads_with_same_metrics() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(5)))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut settings = VolleyConfig::default();
    settings.reports.directory = dir.path().to_path_buf();
    let worker = LoadTestWorker::new(settings);

    let scenario = Scenario::new(
        "mixed",
        vec![
            Step::new("fast", "GET", format!("{}/fast", mock_server.uri())),
            Step::new("broken", "GET", format!("{}/broken", mock_server.uri())),
        ],
    );
    let outcome = worker
        .run(ExecutionRequest::new(TestConfig::requests(10, scenario)).with_test_id("test_rt"))
        .await;

    let report = outcome.report.unwrap();
    let path = outcome.response.report_path.unwrap();
    let reloaded = worker.store().load(&path).await.unwrap();

    let (a, b) = (&report.global_metrics, &reloaded.global_metrics);
    assert_eq!(a.total_requests, b.total_requests);
    assert_eq!(a.successful_requests, b.successful_requests);
    assert_eq!(a.failed_requests, b.failed_requests);
    for (x, y) in [
        (a.error_rate, b.error_rate),
        (a.requests_per_second, b.requests_per_second),
        (a.avg_response_time_ms, b.avg_response_time_ms),
        (a.p95_response_time_ms, b.p95_response_time_ms),
        (a.p99_response_time_ms, b.p99_response_time_ms),
        (a.min_response_time_ms, b.min_response_time_ms),
        (a.max_response_time_ms, b.max_response_time_ms),
    ] {
        assert!((x - y).abs() < 1e-9, "{x} != {y}");
    }

    assert_eq!(b.total_requests, 20);
    assert_eq!(b.failed_requests, 10);
    assert_eq!(reloaded.steps_metrics.len(), 2);
    assert_eq!(reloaded.errors[0].error_type, ErrorCategory::ServerError);
    assert_eq!(reloaded.test_id, "test_rt");
    assert_eq!(worker.store().list().await.unwrap().len(), 1);
}
