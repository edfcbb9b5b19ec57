//! Power attribution via system-wide CPU power apportionment

use crate::pipeline;
use crate::process::SystemCpuSource;
use async_trait::async_trait;
use tracing::warn;

/// Source of per-engine power estimates.
///
/// Infallible by contract: a failed reading degrades to 0 mW.
#[async_trait]
pub trait PowerMetricSource: Send {
    /// Estimate the engine's power draw in milliwatts, given the
    /// engine's aggregate CPU percentage at this tick
    async fn power_mw(&mut self, engine_cpu_percent: f64) -> f64;
}

/// Primary strategy: read total system CPU power from `powermetrics`
/// (privileged) and apportion it by the engine's share of system-wide
/// CPU utilization
pub struct ApportionedPowerSource {
    system_cpu: SystemCpuSource,
}

impl ApportionedPowerSource {
    pub fn new() -> Self {
        Self {
            system_cpu: SystemCpuSource::new(),
        }
    }
}

impl Default for ApportionedPowerSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PowerMetricSource for ApportionedPowerSource {
    async fn power_mw(&mut self, engine_cpu_percent: f64) -> f64 {
        let output = match pipeline::capture("sudo powermetrics -n 1 --samplers cpu_power").await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("powermetrics read failed: {}", e);
                return 0.0;
            }
        };

        let Some(total_mw) = parse_cpu_power_mw(&output) else {
            warn!("No CPU Power line in powermetrics output");
            return 0.0;
        };

        let system_cpu = self.system_cpu.usage_percent();
        apportion_power(engine_cpu_percent, system_cpu, total_mw)
    }
}

/// Apportion total system CPU power to the engine by CPU share.
///
/// An idle system (0% utilization) attributes 0 mW; the division by
/// zero is never allowed to propagate.
pub fn apportion_power(engine_cpu_percent: f64, system_cpu_percent: f64, total_mw: f64) -> f64 {
    if system_cpu_percent <= 0.0 {
        0.0
    } else {
        (engine_cpu_percent / system_cpu_percent) * total_mw
    }
}

/// Extract the total CPU power in milliwatts from powermetrics output.
///
/// Matches the `CPU Power: <n> mW` report line.
pub fn parse_cpu_power_mw(output: &str) -> Option<f64> {
    for line in output.lines() {
        if line.contains("CPU Power:") {
            let value = line.split(':').nth(1)?.split("mW").next()?.trim();
            if let Ok(mw) = value.parse() {
                return Some(mw);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // Captured from `sudo powermetrics -n 1 --samplers cpu_power`
    const POWERMETRICS_OUTPUT: &str = "\
Machine model: Mac14,10
OS version: 23F79
Boot arguments:

*** Running tasks ***

**** Processor usage ****

E-Cluster Power: 43 mW
P0-Cluster Power: 502 mW
P1-Cluster Power: 12 mW
CPU Power: 557 mW
GPU Power: 21 mW
ANE Power: 0 mW
Combined Power (CPU + GPU + ANE): 578 mW
";

    #[test]
    fn test_parse_cpu_power_line() {
        assert_eq!(parse_cpu_power_mw(POWERMETRICS_OUTPUT), Some(557.0));
    }

    #[test]
    fn test_parse_skips_other_power_lines() {
        // "E-Cluster Power" and "GPU Power" lines must not match
        let output = "GPU Power: 999 mW\nCPU Power: 100 mW\n";
        assert_eq!(parse_cpu_power_mw(output), Some(100.0));
    }

    #[test]
    fn test_parse_missing_line() {
        assert_eq!(parse_cpu_power_mw("no power here\n"), None);
        assert_eq!(parse_cpu_power_mw(""), None);
    }

    #[test]
    fn test_parse_malformed_value() {
        assert_eq!(parse_cpu_power_mw("CPU Power: lots mW\n"), None);
    }

    #[test]
    fn test_apportionment() {
        // Engine at 20% of a 40%-busy system draws half the CPU power
        let power = apportion_power(20.0, 40.0, 1000.0);
        assert!((power - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_apportionment_zero_system_cpu() {
        // system_cpu == 0 must yield 0, never a division by zero
        assert_eq!(apportion_power(10.0, 0.0, 1000.0), 0.0);
        assert_eq!(apportion_power(10.0, -1.0, 1000.0), 0.0);
    }

    #[test]
    fn test_apportionment_idle_engine() {
        assert_eq!(apportion_power(0.0, 50.0, 1000.0), 0.0);
    }
}
