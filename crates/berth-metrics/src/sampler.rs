//! Alternative power strategy: continuous `top` sampling through a side
//! file
//!
//! A detached shell pipeline ranks processes by the power column,
//! filters lines matching the engine, strips the trailing unit suffix,
//! and appends the numeric values to `{engine}_power.txt`. The main
//! loop polls the file on each tick and keeps the most recent value.
//! There is no synchronization with the writer, so the reader must
//! tolerate a partially written or momentarily stale tail.

use crate::power::PowerMetricSource;
use crate::{MetricsError, Result};
use async_trait::async_trait;
use berth_core::Engine;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Side-file power sampler backed by a detached `top` pipeline
pub struct TopPowerSampler {
    child: Option<Child>,
    path: PathBuf,
}

impl TopPowerSampler {
    /// Spawn the sampling pipeline, writing into
    /// `{output_dir}/{engine}_power.txt`
    pub fn spawn(engine: Engine, output_dir: &Path) -> Result<Self> {
        let path = output_dir.join(format!("{}_power.txt", engine));
        let file = std::fs::File::create(&path)?;

        // awk's `$NF+0 == $NF` keeps only lines whose power column is
        // numeric after the H suffix is stripped.
        let cmd = format!(
            "top -stats pid,command,power -o power -l 0 | grep '{}' | awk '{{gsub(\"H\", \"\", $NF); if ($NF+0 == $NF) print $NF}}'",
            engine.process_pattern()
        );
        debug!("Spawning power sampler: {}", cmd);

        let child = Command::new("sh")
            .arg("-c")
            .arg(&cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .stderr(Stdio::null())
            .spawn()
            .map_err(MetricsError::Spawn)?;

        Ok(Self {
            child: Some(child),
            path,
        })
    }

    /// Path of the side file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent fully written numeric value in the side file.
    ///
    /// A missing file, an empty file, or a torn trailing line all read
    /// as 0.
    pub fn read_latest(&self) -> f64 {
        read_latest_value(&self.path)
    }
}

/// Scan a sampler side file backwards for the last parseable value
pub fn read_latest_value(path: &Path) -> f64 {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Power side file unreadable: {}", e);
            return 0.0;
        }
    };

    contents
        .lines()
        .rev()
        .find_map(|line| line.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[async_trait]
impl PowerMetricSource for TopPowerSampler {
    async fn power_mw(&mut self, _engine_cpu_percent: f64) -> f64 {
        self.read_latest()
    }
}

impl Drop for TopPowerSampler {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill power sampler: {}", e);
            }
        }
    }
}
