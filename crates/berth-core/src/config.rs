//! Benchmark configuration

use crate::types::{Engine, TestType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Strategy used to attribute power draw to the engine's processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerStrategy {
    /// Apportion total system CPU power by the engine's share of
    /// system-wide CPU utilization (primary strategy)
    Apportioned,
    /// Continuously sample the per-process power column of the OS
    /// process-ranking utility through a side file
    TopSampler,
}

/// Configuration for one resource-monitoring run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Engine under test
    pub engine: Engine,

    /// Workload driven during the run
    pub test_type: TestType,

    /// Total sampling duration
    pub duration: Duration,

    /// Sleep between polling ticks
    pub interval: Duration,

    /// Directory receiving the CSV series and JSON summary
    pub output_dir: PathBuf,

    /// Wait after the workload starts, before the warm-up begins
    pub init_wait: Duration,

    /// Warm-up before the first sample, letting CPU settle past the
    /// engine's startup transients
    pub warmup: Duration,

    /// Compose file for the idle stack; `None` uses the engine's default
    /// lookup in the working directory
    pub compose_file: Option<PathBuf>,

    /// Power attribution strategy
    pub power_strategy: PowerStrategy,
}

impl MonitorConfig {
    /// Create a configuration with the benchmark defaults
    pub fn new(engine: Engine, test_type: TestType) -> Self {
        Self {
            engine,
            test_type,
            duration: Duration::from_secs(600),
            interval: Duration::from_secs(5),
            output_dir: PathBuf::from("results/performance"),
            init_wait: Duration::from_secs(10),
            warmup: Duration::from_secs(30),
            compose_file: None,
            power_strategy: PowerStrategy::Apportioned,
        }
    }

    /// Set the sampling duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the polling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the post-start initialization wait
    pub fn with_init_wait(mut self, wait: Duration) -> Self {
        self.init_wait = wait;
        self
    }

    /// Set the pre-sampling warm-up
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set an explicit compose file for the idle stack
    pub fn with_compose_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.compose_file = Some(file.into());
        self
    }

    /// Set the power attribution strategy
    pub fn with_power_strategy(mut self, strategy: PowerStrategy) -> Self {
        self.power_strategy = strategy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.duration.is_zero() {
            return Err(crate::Error::InvalidConfiguration(
                "duration must be greater than zero".to_string(),
            ));
        }
        if self.interval.is_zero() {
            return Err(crate::Error::InvalidConfiguration(
                "interval must be greater than zero".to_string(),
            ));
        }
        if self.interval > self.duration {
            return Err(crate::Error::InvalidConfiguration(format!(
                "interval ({:?}) must not exceed duration ({:?})",
                self.interval, self.duration
            )));
        }
        Ok(())
    }
}

/// Configuration for one cold-start benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    /// Engine under test
    pub engine: Engine,

    /// Number of stop/start repetitions
    pub repeat_count: u32,

    /// Bound on each readiness poll
    pub ready_timeout: Duration,

    /// Directory receiving the JSON summary
    pub output_dir: PathBuf,

    /// Directory receiving per-run diagnostic logs
    pub logs_dir: PathBuf,

    /// Stop the engine after the final attempt
    pub cleanup: bool,

    /// Echo readiness-poll progress
    pub verbose: bool,
}

impl StartupConfig {
    /// Create a configuration with the benchmark defaults
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            repeat_count: 3,
            ready_timeout: Duration::from_secs(300),
            output_dir: PathBuf::from("results"),
            logs_dir: PathBuf::from("logs"),
            cleanup: true,
            verbose: false,
        }
    }

    /// Set the repetition count
    pub fn with_repeat_count(mut self, count: u32) -> Self {
        self.repeat_count = count;
        self
    }

    /// Set the readiness timeout
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the logs directory
    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = dir.into();
        self
    }

    /// Skip the final engine stop, leaving it running for inspection
    pub fn without_cleanup(mut self) -> Self {
        self.cleanup = false;
        self
    }

    /// Enable progress echoing
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.repeat_count == 0 {
            return Err(crate::Error::InvalidConfiguration(
                "repeat count must be at least 1".to_string(),
            ));
        }
        if self.ready_timeout.is_zero() {
            return Err(crate::Error::InvalidConfiguration(
                "readiness timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_config_defaults() {
        let config = MonitorConfig::new(Engine::DockerDesktop, TestType::Idle);
        assert_eq!(config.duration, Duration::from_secs(600));
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.warmup, Duration::from_secs(30));
        assert_eq!(config.power_strategy, PowerStrategy::Apportioned);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_monitor_config_rejects_zero_duration() {
        let config = MonitorConfig::new(Engine::Colima, TestType::Load)
            .with_duration(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_config_rejects_interval_above_duration() {
        let config = MonitorConfig::new(Engine::Colima, TestType::Load)
            .with_duration(Duration::from_secs(5))
            .with_interval(Duration::from_secs(10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_equal_to_duration_is_valid() {
        let config = MonitorConfig::new(Engine::Orbstack, TestType::Idle)
            .with_duration(Duration::from_secs(5))
            .with_interval(Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_startup_config_defaults() {
        let config = StartupConfig::new(Engine::RancherDesktop);
        assert_eq!(config.repeat_count, 3);
        assert_eq!(config.ready_timeout, Duration::from_secs(300));
        assert!(config.cleanup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_startup_config_rejects_zero_repeats() {
        let config = StartupConfig::new(Engine::Colima).with_repeat_count(0);
        assert!(config.validate().is_err());
    }
}
