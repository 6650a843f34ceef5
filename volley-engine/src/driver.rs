//! Concurrency driver
//!
//! `users` mode spawns one task per virtual user into a [`JoinSet`] and stops
//! them through a shared [`CancellationToken`] once the test duration
//! elapses. `requests` mode runs a fixed number of passes on one session.
//! In both modes the driver returns only after every task has finished.

use crate::error::{EngineError, EngineResult};
use crate::metrics::MetricsCollector;
use crate::model::{format_elapsed, TestConfig, TestMode, TestResult, TestStatus, UserRow};
use crate::runner::ScenarioRunner;
use crate::session::Session;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use volley_config::DriverConfig;
use volley_http::{HttpClient, HttpConfig, HttpError, HttpManager};

/// Builds the HTTP client of session `index`
pub type ClientFactory =
    Arc<dyn Fn(usize) -> Result<Box<dyn HttpClient>, HttpError> + Send + Sync>;

/// Runs load tests against a shared collector
pub struct LoadTestDriver {
    driver: DriverConfig,
    collector: Arc<MetricsCollector>,
    client_factory: ClientFactory,
}

impl LoadTestDriver {
    /// Driver whose sessions each own a reqwest-backed [`HttpManager`]
    pub fn new(
        http: HttpConfig,
        driver: DriverConfig,
        collector: Arc<MetricsCollector>,
    ) -> Self {
        let factory: ClientFactory = Arc::new(move |_| {
            let manager = HttpManager::with_config(http.clone())?;
            Ok(Box::new(manager) as Box<dyn HttpClient>)
        });
        Self::with_client_factory(driver, collector, factory)
    }

    pub fn with_client_factory(
        driver: DriverConfig,
        collector: Arc<MetricsCollector>,
        client_factory: ClientFactory,
    ) -> Self {
        Self {
            driver,
            collector,
            client_factory,
        }
    }

    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }

    /// Run the whole test and report how it ended
    ///
    /// Per-request failures never fail the test. The status is `failed` only
    /// when the mode execution itself returns an error.
    pub async fn execute_test(&self, config: Arc<TestConfig>, test_id: &str) -> TestResult {
        let start_time = Utc::now();
        let started = Instant::now();
        info!(
            "Starting test {} ({} mode, scenario '{}')",
            test_id, config.mode, config.scenario.name
        );

        self.collector.start_collection();

        if let Some(warmup) = config.warmup_duration() {
            info!("Warming up for {}", humantime::format_duration(warmup));
            tokio::time::sleep(warmup).await;
        }

        let outcome = match config.mode {
            TestMode::Users => self.execute_users_mode(&config).await,
            TestMode::Requests => self.execute_requests_mode(&config).await,
        };

        self.collector.stop_collection();

        let (status, error_message) = match outcome {
            Ok(()) => (TestStatus::Success, None),
            Err(e) => {
                error!("Test {} failed: {}", test_id, e);
                (TestStatus::Failed, Some(e.to_string()))
            }
        };

        let end_time = Utc::now();
        let duration = format_elapsed(started.elapsed());
        info!(
            "Test {} finished with status {} after {} ({} requests)",
            test_id,
            status,
            duration,
            self.collector.total_requests()
        );

        TestResult {
            test_id: test_id.to_string(),
            status,
            start_time,
            end_time,
            duration,
            error_message,
        }
    }

    /// Run `virtual_users` concurrent loops until the test duration elapses
    pub async fn execute_users_mode(&self, config: &Arc<TestConfig>) -> EngineResult<()> {
        if config.virtual_users == 0 {
            return Err(EngineError::InvalidState(format!(
                "invalid virtual user count: {}",
                config.virtual_users
            )));
        }

        let duration = config.test_duration(self.driver.default_test_duration);
        let runner = ScenarioRunner::new(Arc::clone(config), Arc::clone(&self.collector));
        let sessions = self.create_sessions(config, config.virtual_users as usize)?;

        info!(
            "Launching {} virtual users for {}",
            sessions.len(),
            humantime::format_duration(duration)
        );

        let token = CancellationToken::new();
        let pause = self.driver.iteration_pause;
        let mut tasks = JoinSet::new();
        for session in sessions {
            tasks.spawn(virtual_user(runner.clone(), session, token.clone(), pause));
        }

        tokio::time::sleep(duration).await;
        debug!("Test duration elapsed, cancelling virtual users");
        token.cancel();

        let mut passes = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(n) => passes += n,
                Err(e) => error!("Virtual user task ended abnormally: {}", e),
            }
        }
        info!("All virtual users stopped after {} scenario passes", passes);

        Ok(())
    }

    /// Run exactly `total_requests` sequential passes on a single session
    pub async fn execute_requests_mode(&self, config: &Arc<TestConfig>) -> EngineResult<()> {
        if config.total_requests == 0 {
            return Err(EngineError::InvalidState(format!(
                "invalid total request count: {}",
                config.total_requests
            )));
        }

        let runner = ScenarioRunner::new(Arc::clone(config), Arc::clone(&self.collector));
        let mut session = self
            .create_sessions(config, 1)?
            .pop()
            .ok_or_else(|| EngineError::InvalidState("no session created".to_string()))?;

        info!("Running {} sequential scenario passes", config.total_requests);
        let mut failed = 0u32;
        for iteration in 0..config.total_requests {
            if let Err(e) = runner.run_once(&mut session).await {
                failed += 1;
                warn!("Iteration {} failed: {}", iteration + 1, e);
            }
        }
        if failed > 0 {
            info!(
                "{} of {} iterations reported an error",
                failed, config.total_requests
            );
        }

        Ok(())
    }

    fn create_sessions(&self, config: &TestConfig, count: usize) -> EngineResult<Vec<Session>> {
        let rows: Vec<Arc<UserRow>> = config.users_data.iter().cloned().map(Arc::new).collect();

        (0..count)
            .map(|index| {
                let client = (self.client_factory)(index).map_err(EngineError::ClientSetup)?;
                Ok(Session::new(index, Session::row_for(index, &rows), client))
            })
            .collect()
    }
}

/// One virtual user loop; returns the number of completed passes
///
/// Cancellation is checked between passes, so an in-flight request is
/// allowed to finish.
async fn virtual_user(
    runner: ScenarioRunner,
    mut session: Session,
    token: CancellationToken,
    pause: Duration,
) -> usize {
    let mut passes = 0;
    while !token.is_cancelled() {
        if let Err(e) = runner.run_once(&mut session).await {
            warn!("Virtual user {} pass failed: {}", session.id, e);
        }
        passes += 1;

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }
    debug!("Virtual user {} stopping after {} passes", session.id, passes);
    passes
}
