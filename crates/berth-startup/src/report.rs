//! Persistence of startup summaries and diagnostic logs

use crate::Result;
use berth_core::{StartupConfig, StartupSummary};
use std::path::PathBuf;
use tracing::info;

/// Path of the JSON summary for this engine
pub fn summary_path(config: &StartupConfig) -> PathBuf {
    config
        .output_dir
        .join(format!("{}_startup.json", config.engine))
}

/// Path of the free-text diagnostic log for this engine
pub fn log_path(config: &StartupConfig) -> PathBuf {
    config
        .logs_dir
        .join(format!("{}_startup.log", config.engine))
}

/// Write the startup summary as pretty-printed JSON
pub fn write_summary(config: &StartupConfig, summary: &StartupSummary) -> Result<PathBuf> {
    std::fs::create_dir_all(&config.output_dir)?;

    let path = summary_path(config);
    std::fs::write(&path, serde_json::to_string_pretty(summary)?)?;

    info!("Results saved to {}", path.display());
    Ok(path)
}

/// Write the diagnostic log snapshot for a successful attempt
pub fn write_log(config: &StartupConfig, startup_seconds: f64, engine_info: &str) -> Result<()> {
    std::fs::create_dir_all(&config.logs_dir)?;

    let contents = format!(
        "=== Startup Information ===\nStartup time: {} seconds\n=== System Information ===\n{}",
        startup_seconds, engine_info
    );
    std::fs::write(log_path(config), contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::Engine;

    #[test]
    fn test_summary_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let config = StartupConfig::new(Engine::RancherDesktop)
            .with_output_dir(dir.path())
            .with_logs_dir(dir.path());
        let summary = StartupSummary::from_times(config.engine, &[4.1, 3.9, 4.3]).unwrap();

        let path = write_summary(&config, &summary).unwrap();
        assert!(path.to_string_lossy().ends_with("rancher-desktop_startup.json"));

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed["engine"], "rancher-desktop");
        assert_eq!(parsed["repeat_count"], 3);
        assert_eq!(parsed["results"]["min"], 3.9);
        assert_eq!(parsed["results"]["max"], 4.3);
        assert_eq!(
            parsed["results"]["all_times"],
            serde_json::json!([4.1, 3.9, 4.3])
        );
    }

    #[test]
    fn test_log_contents() {
        let dir = tempfile::tempdir().unwrap();
        let config = StartupConfig::new(Engine::Colima)
            .with_output_dir(dir.path())
            .with_logs_dir(dir.path());

        write_log(&config, 5.25, "server version: test\n").unwrap();

        let contents = std::fs::read_to_string(log_path(&config)).unwrap();
        assert!(contents.contains("Startup time: 5.25 seconds"));
        assert!(contents.contains("server version: test"));
    }
}
