//! Core type definitions for berth

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Container-runtime engines under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    /// Docker Desktop
    DockerDesktop,
    /// Podman Desktop
    PodmanDesktop,
    /// OrbStack
    Orbstack,
    /// Rancher Desktop
    RancherDesktop,
    /// colima (CLI-managed Lima VM)
    Colima,
}

impl Engine {
    /// All engines in the fixed sweep order
    pub fn all() -> [Engine; 5] {
        [
            Engine::DockerDesktop,
            Engine::PodmanDesktop,
            Engine::Orbstack,
            Engine::RancherDesktop,
            Engine::Colima,
        ]
    }

    /// Kebab-case identifier used in CLI arguments and file names
    pub fn id(&self) -> &'static str {
        match self {
            Engine::DockerDesktop => "docker-desktop",
            Engine::PodmanDesktop => "podman-desktop",
            Engine::Orbstack => "orbstack",
            Engine::RancherDesktop => "rancher-desktop",
            Engine::Colima => "colima",
        }
    }

    /// Application name used to launch and quit the engine's desktop app.
    ///
    /// colima has no desktop app; its name is only used for display.
    pub fn app_name(&self) -> &'static str {
        match self {
            Engine::DockerDesktop => "Docker Desktop",
            Engine::PodmanDesktop => "Podman Desktop",
            Engine::Orbstack => "OrbStack",
            Engine::RancherDesktop => "Rancher Desktop",
            Engine::Colima => "colima",
        }
    }

    /// Substring matched against the process table when aggregating
    /// per-engine CPU and memory usage
    pub fn process_pattern(&self) -> &'static str {
        match self {
            Engine::DockerDesktop => "Docker",
            Engine::PodmanDesktop => "Podman",
            Engine::Orbstack => "OrbStack",
            Engine::RancherDesktop => "Rancher",
            Engine::Colima => "colima",
        }
    }

    /// Client command used for readiness probes and workloads
    pub fn cli(&self) -> &'static str {
        match self {
            Engine::PodmanDesktop => "podman",
            _ => "docker",
        }
    }

    /// Fixed name of the synthetic stress container for this engine
    pub fn stress_container(&self) -> &'static str {
        match self {
            Engine::PodmanDesktop => "stress-test-podman",
            _ => "stress-test",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docker-desktop" => Ok(Engine::DockerDesktop),
            "podman-desktop" => Ok(Engine::PodmanDesktop),
            "orbstack" => Ok(Engine::Orbstack),
            "rancher-desktop" => Ok(Engine::RancherDesktop),
            "colima" => Ok(Engine::Colima),
            _ => Err(format!("Unknown engine: {}", s)),
        }
    }
}

/// Kind of workload driven during a resource-monitoring run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// Multi-service compose stack brought up without active load
    Idle,
    /// Bounded-duration synthetic CPU/memory stress container
    Load,
}

impl TestType {
    /// Identifier used in CLI arguments and file names
    pub fn id(&self) -> &'static str {
        match self {
            TestType::Idle => "idle",
            TestType::Load => "load",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(TestType::Idle),
            "load" => Ok(TestType::Load),
            _ => Err(format!("Unknown test type: {}", s)),
        }
    }
}

/// One resource reading taken on a polling tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the reading was collected
    pub timestamp: DateTime<Utc>,

    /// Aggregate CPU usage across the engine's processes, in percent
    pub cpu_percent: f64,

    /// Aggregate resident memory across the engine's processes, in MB
    pub memory_mb: f64,

    /// Estimated power draw attributed to the engine, in milliwatts
    pub power_mw: f64,
}

/// Averages computed over one monitoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub cpu_average: f64,
    pub memory_average: f64,
    pub power_average_mw: f64,
}

/// Persisted summary of one (engine, test type) monitoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub engine: Engine,
    pub test_type: TestType,
    /// Configured run duration in seconds
    pub duration: u64,
    /// Configured polling interval in seconds
    pub interval: u64,
    /// Number of samples actually collected
    pub samples: usize,
    pub metrics: RunMetrics,
}

impl RunSummary {
    /// Reduce a sample series to its run summary.
    ///
    /// Returns `None` for an empty series; an empty run produces no
    /// summary rather than NaN averages.
    pub fn from_series(
        engine: Engine,
        test_type: TestType,
        duration: u64,
        interval: u64,
        series: &[Sample],
    ) -> Option<Self> {
        if series.is_empty() {
            return None;
        }

        Some(RunSummary {
            engine,
            test_type,
            duration,
            interval,
            samples: series.len(),
            metrics: RunMetrics {
                cpu_average: mean(series.iter().map(|s| s.cpu_percent)),
                memory_average: mean(series.iter().map(|s| s.memory_mb)),
                power_average_mw: mean(series.iter().map(|s| s.power_mw)),
            },
        })
    }
}

/// Outcome of one cold-start repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupAttempt {
    pub engine: Engine,
    /// 1-based repetition index
    pub attempt_index: u32,
    /// Wall-clock seconds from start command to readiness; `None` when
    /// the engine never became ready within the bounded retries
    pub startup_seconds: Option<f64>,
}

/// Statistics over the successful startup timings of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupResults {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Successful timings in attempt order
    pub all_times: Vec<f64>,
}

/// Persisted summary of one engine's cold-start run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupSummary {
    pub engine: Engine,
    pub timestamp: DateTime<Utc>,
    /// Count of successful attempts only; failed attempts never enter
    /// the denominator
    pub repeat_count: usize,
    pub results: StartupResults,
}

impl StartupSummary {
    /// Aggregate successful timings into a summary.
    ///
    /// Returns `None` when no attempt succeeded; a run with zero
    /// successes produces no summary.
    pub fn from_times(engine: Engine, times: &[f64]) -> Option<Self> {
        if times.is_empty() {
            return None;
        }

        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(StartupSummary {
            engine,
            timestamp: Utc::now(),
            repeat_count: times.len(),
            results: StartupResults {
                average: mean(times.iter().copied()),
                min,
                max,
                all_times: times.to_vec(),
            },
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cpu: f64, mem: f64, power: f64) -> Sample {
        Sample {
            timestamp: Utc::now(),
            cpu_percent: cpu,
            memory_mb: mem,
            power_mw: power,
        }
    }

    #[test]
    fn test_engine_parsing() {
        assert_eq!(
            "docker-desktop".parse::<Engine>().unwrap(),
            Engine::DockerDesktop
        );
        assert_eq!("OrbStack".parse::<Engine>().unwrap(), Engine::Orbstack);
        assert_eq!("colima".parse::<Engine>().unwrap(), Engine::Colima);
        assert!("containerd".parse::<Engine>().is_err());
    }

    #[test]
    fn test_engine_id_round_trip() {
        for engine in Engine::all() {
            assert_eq!(engine.id().parse::<Engine>().unwrap(), engine);
        }
    }

    #[test]
    fn test_engine_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Engine::RancherDesktop).unwrap();
        assert_eq!(json, "\"rancher-desktop\"");
    }

    #[test]
    fn test_engine_cli_selection() {
        assert_eq!(Engine::PodmanDesktop.cli(), "podman");
        assert_eq!(Engine::DockerDesktop.cli(), "docker");
        assert_eq!(Engine::Colima.cli(), "docker");
    }

    #[test]
    fn test_run_summary_from_series() {
        let series = vec![
            sample(10.0, 100.0, 500.0),
            sample(20.0, 300.0, 1500.0),
        ];
        let summary =
            RunSummary::from_series(Engine::DockerDesktop, TestType::Idle, 10, 5, &series)
                .unwrap();

        assert_eq!(summary.samples, 2);
        assert!((summary.metrics.cpu_average - 15.0).abs() < f64::EPSILON);
        assert!((summary.metrics.memory_average - 200.0).abs() < f64::EPSILON);
        assert!((summary.metrics.power_average_mw - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_summary_empty_series_is_skipped() {
        assert!(
            RunSummary::from_series(Engine::Colima, TestType::Load, 10, 5, &[]).is_none()
        );
    }

    #[test]
    fn test_startup_summary_from_times() {
        let summary =
            StartupSummary::from_times(Engine::Orbstack, &[4.1, 3.9, 4.3]).unwrap();

        assert_eq!(summary.repeat_count, 3);
        assert!((summary.results.average - 4.1).abs() < 1e-9);
        assert!((summary.results.min - 3.9).abs() < f64::EPSILON);
        assert!((summary.results.max - 4.3).abs() < f64::EPSILON);
        // Attempt order is preserved, not sorted
        assert_eq!(summary.results.all_times, vec![4.1, 3.9, 4.3]);
    }

    #[test]
    fn test_startup_summary_single_success() {
        let summary = StartupSummary::from_times(Engine::Colima, &[5.0]).unwrap();
        assert_eq!(summary.repeat_count, 1);
        assert_eq!(summary.results.average, 5.0);
        assert_eq!(summary.results.min, 5.0);
        assert_eq!(summary.results.max, 5.0);
    }

    #[test]
    fn test_startup_summary_zero_successes() {
        assert!(StartupSummary::from_times(Engine::Colima, &[]).is_none());
    }

    #[test]
    fn test_repeat_count_matches_all_times() {
        let summary =
            StartupSummary::from_times(Engine::DockerDesktop, &[1.0, 2.0]).unwrap();
        assert_eq!(summary.repeat_count, summary.results.all_times.len());
    }
}
