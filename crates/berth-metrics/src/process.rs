//! Process-level CPU and memory scraping

use crate::pipeline;
use async_trait::async_trait;
use berth_core::Engine;
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tracing::warn;

/// Aggregate resource usage across an engine's matching processes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProcessUsage {
    /// Summed CPU usage in percent
    pub cpu_percent: f64,
    /// Summed resident memory in MB
    pub memory_mb: f64,
}

/// Source of per-engine process metrics.
///
/// Infallible by contract: any scrape or parse failure yields a
/// zero-valued reading.
#[async_trait]
pub trait ProcessMetricSource: Send {
    /// Read the engine's aggregate CPU and memory usage
    async fn usage(&mut self) -> ProcessUsage;
}

/// Scrapes the process table with a `ps aux` pipeline, summing CPU% and
/// resident memory over processes whose command matches the engine's
/// display-name substring
pub struct PsProcessSource {
    pattern: &'static str,
}

impl PsProcessSource {
    pub fn new(engine: Engine) -> Self {
        Self {
            pattern: engine.process_pattern(),
        }
    }
}

#[async_trait]
impl ProcessMetricSource for PsProcessSource {
    async fn usage(&mut self) -> ProcessUsage {
        let cmd = format!(
            "ps aux | grep {} | grep -v grep | awk '{{cpu += $3; mem += $6}} END {{print cpu\",\"mem}}'",
            self.pattern
        );

        match pipeline::capture(&cmd).await {
            Ok(output) => parse_ps_totals(&output).unwrap_or_else(|| {
                warn!("Unparseable ps totals for pattern {:?}", self.pattern);
                ProcessUsage::default()
            }),
            Err(e) => {
                warn!("ps scrape failed for pattern {:?}: {}", self.pattern, e);
                ProcessUsage::default()
            }
        }
    }
}

/// Parse the `cpu,mem` totals line emitted by the ps pipeline.
///
/// Memory arrives as resident KB and is converted to MB.
pub fn parse_ps_totals(output: &str) -> Option<ProcessUsage> {
    let line = output.trim();
    if line.is_empty() {
        return None;
    }

    let (cpu, mem_kb) = line.split_once(',')?;
    Some(ProcessUsage {
        cpu_percent: cpu.trim().parse().ok()?,
        memory_mb: mem_kb.trim().parse::<f64>().ok()? / 1024.0,
    })
}

/// System-wide CPU utilization, read through sysinfo.
///
/// CPU usage is computed between consecutive refreshes, so the reading
/// only becomes meaningful from the second call onward; the constructor
/// primes the first refresh.
pub struct SystemCpuSource {
    sys: System,
}

impl SystemCpuSource {
    pub fn new() -> Self {
        let refresh =
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage());
        let mut sys = System::new_with_specifics(refresh);
        sys.refresh_cpu_usage();
        Self { sys }
    }

    /// Current system-wide CPU utilization in percent
    pub fn usage_percent(&mut self) -> f64 {
        self.sys.refresh_cpu_usage();
        self.sys.global_cpu_usage() as f64
    }
}

impl Default for SystemCpuSource {
    fn default() -> Self {
        Self::new()
    }
}
