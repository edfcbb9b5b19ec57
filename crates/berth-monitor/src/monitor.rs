//! The sampling and aggregation loop

use crate::{report, MonitorError, Result};
use berth_core::{MonitorConfig, PowerStrategy, RunSummary, Sample, TestType};
use berth_engine::{adapter_for, EngineAdapter};
use berth_metrics::{
    ApportionedPowerSource, PowerMetricSource, ProcessMetricSource, PsProcessSource,
    TopPowerSampler,
};
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Runs one (engine, test type) experiment end to end
pub struct ResourceMonitor {
    config: MonitorConfig,
    adapter: Box<dyn EngineAdapter>,
    processes: Box<dyn ProcessMetricSource>,
    power: Box<dyn PowerMetricSource>,
}

impl ResourceMonitor {
    /// Create a monitor with the real adapter and metric sources for
    /// the configured engine
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.output_dir)?;

        let adapter = adapter_for(config.engine);
        let processes = Box::new(PsProcessSource::new(config.engine));
        let power: Box<dyn PowerMetricSource> = match config.power_strategy {
            PowerStrategy::Apportioned => Box::new(ApportionedPowerSource::new()),
            PowerStrategy::TopSampler => {
                Box::new(TopPowerSampler::spawn(config.engine, &config.output_dir)?)
            }
        };

        Ok(Self {
            config,
            adapter,
            processes,
            power,
        })
    }

    /// Create a monitor from explicit parts; used by tests to inject
    /// mock adapters and sources
    pub fn with_parts(
        config: MonitorConfig,
        adapter: Box<dyn EngineAdapter>,
        processes: Box<dyn ProcessMetricSource>,
        power: Box<dyn PowerMetricSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            adapter,
            processes,
            power,
        })
    }

    /// Run the experiment.
    ///
    /// Returns the run summary, or `None` when no sample was collected
    /// (in which case nothing is persisted). The workload is torn down
    /// on every exit path, including a workload-start failure.
    pub async fn run(&mut self) -> Result<Option<RunSummary>> {
        info!(
            "Monitoring {} ({} test) for {:?} at {:?} intervals",
            self.config.engine, self.config.test_type, self.config.duration, self.config.interval
        );

        // Stop before start: clear any stale workload from a previous run
        self.teardown().await;

        let body = self.run_body().await;

        // Teardown is unconditional; only then does the body's outcome
        // propagate
        self.teardown().await;
        let (series, baseline_mw, final_mw) = body?;

        let average = if series.is_empty() {
            0.0
        } else {
            series.iter().map(|s| s.power_mw).sum::<f64>() / series.len() as f64
        };

        // Baseline and final readings are reported alongside the series
        // average but never folded into it
        println!();
        println!("Baseline power: {:.1}mW", baseline_mw);
        println!("Final power: {:.1}mW", final_mw);
        println!("Average power: {:.1}mW", average);

        let summary = RunSummary::from_series(
            self.config.engine,
            self.config.test_type,
            self.config.duration.as_secs(),
            self.config.interval.as_secs(),
            &series,
        );

        match summary {
            Some(ref summary) => {
                report::write_series(&self.config, &series)?;
                report::write_summary(&self.config, summary)?;
            }
            None => warn!("No samples collected; skipping result files"),
        }

        Ok(summary)
    }

    async fn run_body(&mut self) -> Result<(Vec<Sample>, f64, f64)> {
        self.start_workload().await?;

        sleep(self.config.init_wait).await;
        info!(
            "Waiting {:?} for CPU to stabilize before sampling",
            self.config.warmup
        );
        sleep(self.config.warmup).await;

        let baseline_mw = self.read_power().await;
        let series = self.sample_series().await;
        let final_mw = self.read_power().await;

        Ok((series, baseline_mw, final_mw))
    }

    /// The fixed-interval polling loop
    async fn sample_series(&mut self) -> Vec<Sample> {
        let mut series = Vec::new();
        let deadline = tokio::time::Instant::now() + self.config.duration;

        println!(
            "Starting monitoring for {} seconds...",
            self.config.duration.as_secs()
        );

        while tokio::time::Instant::now() < deadline {
            let usage = self.processes.usage().await;
            let power_mw = self.power.power_mw(usage.cpu_percent).await;
            let timestamp = Utc::now();

            println!(
                "[{}] CPU: {:.1}% MEM: {:.1}MB POWER: {:.1}mW",
                timestamp.format("%Y-%m-%d %H:%M:%S"),
                usage.cpu_percent,
                usage.memory_mb,
                power_mw
            );

            series.push(Sample {
                timestamp,
                cpu_percent: usage.cpu_percent,
                memory_mb: usage.memory_mb,
                power_mw,
            });

            sleep(self.config.interval).await;
        }

        series
    }

    /// One power reading outside the series (baseline/final)
    async fn read_power(&mut self) -> f64 {
        let usage = self.processes.usage().await;
        self.power.power_mw(usage.cpu_percent).await
    }

    async fn start_workload(&self) -> Result<()> {
        let started = match self.config.test_type {
            TestType::Idle => {
                self.adapter
                    .compose_up(self.config.compose_file.as_deref())
                    .await
            }
            TestType::Load => {
                // Replace any leftover container of the same fixed name
                self.adapter.remove_stress().await;
                self.adapter.start_stress(self.config.duration).await
            }
        };

        if let Err(source) = started {
            error!(
                "Failed to start {} workload for {}: {}",
                self.config.test_type, self.config.engine, source
            );
            if let Some(logs) = self.adapter.workload_logs().await {
                error!("Workload logs:\n{}", logs);
            }
            return Err(MonitorError::WorkloadStart {
                engine: self.config.engine,
                test_type: self.config.test_type,
                source,
            });
        }
        Ok(())
    }

    /// Best-effort workload teardown; absence is not an error
    async fn teardown(&self) {
        match self.config.test_type {
            TestType::Idle => {
                self.adapter
                    .compose_down(self.config.compose_file.as_deref())
                    .await
            }
            TestType::Load => self.adapter.remove_stress().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::Engine;
    use berth_engine::MockEngineAdapter;
    use berth_metrics::{FixedPowerSource, FixedProcessSource, ScriptedProcessSource};
    use std::time::Duration;

    fn fast_config(dir: &tempfile::TempDir, test_type: TestType) -> MonitorConfig {
        MonitorConfig::new(Engine::DockerDesktop, test_type)
            .with_duration(Duration::from_secs(10))
            .with_interval(Duration::from_secs(5))
            .with_init_wait(Duration::ZERO)
            .with_warmup(Duration::ZERO)
            .with_output_dir(dir.path())
    }

    fn monitor_with_mock(
        config: MonitorConfig,
        mock: &MockEngineAdapter,
    ) -> ResourceMonitor {
        ResourceMonitor::with_parts(
            config,
            Box::new(mock.clone()),
            Box::new(FixedProcessSource::new(10.0, 100.0)),
            Box::new(FixedPowerSource::new(500.0)),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_run_collects_expected_samples() {
        // duration=10, interval=5 => exactly 2 samples
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(&dir, TestType::Idle);
        let mock = MockEngineAdapter::new(Engine::DockerDesktop);
        let mut monitor = monitor_with_mock(config.clone(), &mock);

        let summary = monitor.run().await.unwrap().unwrap();

        assert_eq!(summary.samples, 2);
        assert!((summary.metrics.cpu_average - 10.0).abs() < f64::EPSILON);
        assert!((summary.metrics.power_average_mw - 500.0).abs() < f64::EPSILON);

        // CSV: header plus one row per sample
        let csv = std::fs::read_to_string(report::series_path(&config)).unwrap();
        assert_eq!(csv.lines().count(), 3);

        // JSON: samples field matches
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report::summary_path(&config)).unwrap())
                .unwrap();
        assert_eq!(json["samples"], 2);

        // Workload torn down before and after the run
        assert!(!mock.workload_up());
        assert_eq!(
            mock.calls(),
            vec!["compose_down", "compose_up", "compose_down"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_run_replaces_stale_container() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(&dir, TestType::Load);
        let mock = MockEngineAdapter::new(Engine::DockerDesktop);
        let mut monitor = monitor_with_mock(config, &mock);

        monitor.run().await.unwrap();

        // Pre-run teardown, pre-start replacement, start, post-run teardown
        assert_eq!(
            mock.calls(),
            vec![
                "remove_stress",
                "remove_stress",
                "start_stress",
                "remove_stress"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_workload_start_failure_is_fatal_but_torn_down() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(&dir, TestType::Idle);
        let mock = MockEngineAdapter::new(Engine::DockerDesktop);
        mock.fail_workload_start();
        let mut monitor = monitor_with_mock(config.clone(), &mock);

        let err = monitor.run().await.unwrap_err();
        assert!(matches!(err, MonitorError::WorkloadStart { .. }));

        // Teardown still ran after the failed start
        assert_eq!(mock.calls().last().map(String::as_str), Some("compose_down"));

        // Nothing persisted
        assert!(!report::series_path(&config).exists());
        assert!(!report::summary_path(&config).exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timestamps_monotonic_and_power_scripted() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(&dir, TestType::Idle)
            .with_duration(Duration::from_secs(15))
            .with_interval(Duration::from_secs(5));
        let mock = MockEngineAdapter::new(Engine::DockerDesktop);
        let monitor = ResourceMonitor::with_parts(
            config.clone(),
            Box::new(mock.clone()),
            Box::new(ScriptedProcessSource::new([
                // baseline reading consumes the first entry
                (0.0, 0.0),
                (10.0, 100.0),
                (20.0, 200.0),
                (30.0, 300.0),
            ])),
            Box::new(FixedPowerSource::new(100.0)),
        );
        let mut monitor = monitor.unwrap();

        let summary = monitor.run().await.unwrap().unwrap();
        assert_eq!(summary.samples, 3);
        assert!((summary.metrics.cpu_average - 20.0).abs() < f64::EPSILON);

        let csv = std::fs::read_to_string(report::series_path(&config)).unwrap();
        let timestamps: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        let mut sorted = timestamps.clone();
        sorted.sort();
        assert_eq!(timestamps, sorted);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = MonitorConfig::new(Engine::Colima, TestType::Idle)
            .with_duration(Duration::from_secs(1))
            .with_interval(Duration::from_secs(2));
        let mock = MockEngineAdapter::new(Engine::Colima);
        let result = ResourceMonitor::with_parts(
            config,
            Box::new(mock),
            Box::new(FixedProcessSource::new(0.0, 0.0)),
            Box::new(FixedPowerSource::new(0.0)),
        );
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }
}
