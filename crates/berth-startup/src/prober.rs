//! The cold-start measurement loop

use crate::{report, Result};
use berth_core::{StartupAttempt, StartupConfig, StartupSummary};
use berth_engine::{adapter_for, EngineAdapter};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

/// Readiness tries per attempt: the initial check plus two retries
const READY_RETRIES: u32 = 3;

/// Pause before a readiness retry
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Pause after stopping an engine, letting the host settle
const SETTLE: Duration = Duration::from_secs(5);

/// Phases of one cold-start attempt
///
/// `NotRunning → Starting → (Ready | TimedOut) → Stopping → NotRunning`;
/// a timed-out readiness check is retried before the attempt is
/// abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    NotRunning,
    Starting,
    Ready,
    TimedOut,
    Stopping,
}

/// Result of one engine's full startup test
#[derive(Debug, Clone)]
pub struct StartupOutcome {
    /// Every attempt, successful or not, in order
    pub attempts: Vec<StartupAttempt>,
    /// Aggregate over the successful attempts; `None` when none
    /// succeeded (in which case no summary file was written)
    pub summary: Option<StartupSummary>,
}

/// Measures cold-start latency for one engine
pub struct StartupProber {
    config: StartupConfig,
    adapter: Box<dyn EngineAdapter>,
}

impl StartupProber {
    /// Create a prober with the real adapter for the configured engine
    pub fn new(config: StartupConfig) -> Result<Self> {
        config.validate()?;
        let adapter = adapter_for(config.engine);
        Ok(Self { config, adapter })
    }

    /// Create a prober with an explicit adapter; used by tests
    pub fn with_adapter(config: StartupConfig, adapter: Box<dyn EngineAdapter>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, adapter })
    }

    /// Run the full stop/start/measure loop.
    ///
    /// Per-attempt failures never error; a run where every attempt
    /// failed returns an outcome with no summary. Errors are reserved
    /// for result-persistence problems.
    pub async fn run(&mut self) -> Result<StartupOutcome> {
        let engine = self.config.engine;
        let mut times: Vec<f64> = Vec::new();
        let mut attempts = Vec::new();

        println!("Testing {}...", engine);

        for index in 1..=self.config.repeat_count {
            println!("Attempt {} of {}", index, self.config.repeat_count);

            if self.adapter.is_running().await {
                self.adapter.stop().await;
                sleep(SETTLE).await;
            }

            let measured = self.measure_start().await;
            attempts.push(StartupAttempt {
                engine,
                attempt_index: index,
                startup_seconds: measured,
            });

            match measured {
                Some(seconds) => {
                    times.push(seconds);
                    println!("Startup time: {:.2} seconds", seconds);
                }
                None => {
                    // Abandoned attempt; the next iteration's liveness
                    // check deals with whatever state the engine is in
                    println!("Error starting engine");
                    continue;
                }
            }

            let last = index == self.config.repeat_count;
            if !last || self.config.cleanup {
                self.adapter.stop().await;
                sleep(SETTLE).await;
            } else {
                debug!("Cleanup disabled; leaving {} running", engine);
            }
        }

        let summary = StartupSummary::from_times(engine, &times);
        match summary {
            Some(ref summary) => {
                let path = report::write_summary(&self.config, summary)?;
                println!("Results saved to {}", path.display());
                if self.config.verbose {
                    println!("JSON contents:");
                    println!("{}", serde_json::to_string_pretty(summary)?);
                }
            }
            None => println!("No successful startup measurements"),
        }

        Ok(StartupOutcome { attempts, summary })
    }

    /// Start the engine and measure wall-clock time to readiness.
    ///
    /// Returns `None` when the engine never became ready within the
    /// bounded retries; never errors.
    async fn measure_start(&self) -> Option<f64> {
        let engine = self.config.engine;
        println!("Starting {}...", engine);

        let started_at = Instant::now();
        if let Err(e) = self.adapter.start().await {
            error!("Error starting {}: {}", engine, e);
            return None;
        }

        let mut phase = AttemptPhase::Starting;
        for try_index in 0..READY_RETRIES {
            if self.adapter.check_ready(self.config.ready_timeout).await {
                phase = AttemptPhase::Ready;
                break;
            }

            phase = AttemptPhase::TimedOut;
            if try_index < READY_RETRIES - 1 {
                println!(
                    "Retrying to start {} (attempt {}/{})...",
                    engine,
                    try_index + 2,
                    READY_RETRIES
                );
                sleep(RETRY_BACKOFF).await;
            } else {
                println!(
                    "Error: {} is not ready after {} attempts",
                    engine, READY_RETRIES
                );
            }
        }

        if phase != AttemptPhase::Ready {
            return None;
        }

        let startup_seconds = started_at.elapsed().as_secs_f64();

        let info = self.adapter.capture_info().await;
        if let Err(e) = report::write_log(&self.config, startup_seconds, &info) {
            warn!("Failed to write startup log for {}: {}", engine, e);
        }

        Some(startup_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::Engine;
    use berth_engine::MockEngineAdapter;

    fn test_config(dir: &tempfile::TempDir, engine: Engine) -> StartupConfig {
        StartupConfig::new(engine)
            .with_output_dir(dir.path())
            .with_logs_dir(dir.path())
            .with_ready_timeout(Duration::from_secs(10))
    }

    fn prober_with_mock(config: StartupConfig, mock: &MockEngineAdapter) -> StartupProber {
        StartupProber::with_adapter(config, Box::new(mock.clone())).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, Engine::DockerDesktop);
        let mock = MockEngineAdapter::new(Engine::DockerDesktop);
        mock.script_ready([
            Some(Duration::from_secs(4)),
            Some(Duration::from_secs(4)),
            Some(Duration::from_secs(4)),
        ]);
        let mut prober = prober_with_mock(config.clone(), &mock);

        let outcome = prober.run().await.unwrap();
        let summary = outcome.summary.unwrap();

        assert_eq!(outcome.attempts.len(), 3);
        assert_eq!(summary.repeat_count, 3);
        assert_eq!(summary.results.all_times.len(), 3);
        for time in &summary.results.all_times {
            assert!((time - 4.0).abs() < 0.6, "measured {}", time);
        }

        assert!(report::summary_path(&config).exists());
        assert!(report::log_path(&config).exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_keeps_only_successes() {
        // Attempts 1 and 3 never become ready, attempt 2 takes 5s
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, Engine::Orbstack);
        let mock = MockEngineAdapter::new(Engine::Orbstack);
        mock.script_ready([None, Some(Duration::from_secs(5)), None]);
        let mut prober = prober_with_mock(config.clone(), &mock);

        let outcome = prober.run().await.unwrap();
        let summary = outcome.summary.unwrap();

        assert_eq!(summary.repeat_count, 1);
        assert_eq!(summary.results.all_times.len(), 1);
        assert!((summary.results.average - summary.results.min).abs() < f64::EPSILON);
        assert!((summary.results.average - summary.results.max).abs() < f64::EPSILON);
        assert!(summary.results.average >= 5.0);

        assert_eq!(outcome.attempts[0].startup_seconds, None);
        assert!(outcome.attempts[1].startup_seconds.is_some());
        assert_eq!(outcome.attempts[2].startup_seconds, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_successes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, Engine::Colima)
            .with_ready_timeout(Duration::from_secs(2));
        let mock = MockEngineAdapter::new(Engine::Colima);
        mock.script_ready([None, None, None]);
        let mut prober = prober_with_mock(config.clone(), &mock);

        let outcome = prober.run().await.unwrap();

        assert!(outcome.summary.is_none());
        assert_eq!(outcome.attempts.len(), 3);
        assert!(!report::summary_path(&config).exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_stops_engine_after_final_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, Engine::DockerDesktop).with_repeat_count(1);
        let mock = MockEngineAdapter::new(Engine::DockerDesktop);
        let mut prober = prober_with_mock(config, &mock);

        prober.run().await.unwrap();
        assert!(!mock.is_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_cleanup_leaves_engine_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, Engine::DockerDesktop)
            .with_repeat_count(1)
            .without_cleanup();
        let mock = MockEngineAdapter::new(Engine::DockerDesktop);
        let mut prober = prober_with_mock(config, &mock);

        prober.run().await.unwrap();
        assert!(mock.is_running().await);
    }
}
