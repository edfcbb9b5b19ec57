//! Adapter for desktop-app engines (Docker Desktop, Podman Desktop,
//! OrbStack, Rancher Desktop)
//!
//! These engines share one lifecycle shape: launched with `open -a`,
//! quit through AppleScript, and observed through the OS process table.
//! Everything else comes from the engine's lookup tables via the trait's
//! default implementations.

use crate::adapter::EngineAdapter;
use crate::{command, Result};
use async_trait::async_trait;
use berth_core::Engine;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};
use tracing::info;

/// Adapter for engines distributed as a macOS desktop application
pub struct DesktopApp {
    engine: Engine,
}

impl DesktopApp {
    pub fn new(engine: Engine) -> Self {
        debug_assert!(engine != Engine::Colima, "colima has a dedicated adapter");
        Self { engine }
    }
}

/// Scan the OS process table for a case-insensitive name match
pub(crate) fn process_running(name: &str) -> bool {
    let refresh =
        RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing());
    let mut sys = System::new_with_specifics(refresh);
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let needle = name.to_lowercase();
    sys.processes()
        .values()
        .any(|p| p.name().to_string_lossy().to_lowercase().contains(&needle))
}

#[async_trait]
impl EngineAdapter for DesktopApp {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn is_running(&self) -> bool {
        let name = self.engine.app_name().to_string();
        tokio::task::spawn_blocking(move || process_running(&name))
            .await
            .unwrap_or(false)
    }

    async fn start(&self) -> Result<()> {
        info!("Starting {}", self.engine);
        command::run_checked("open", &["-a", self.engine.app_name()]).await
    }

    async fn stop(&self) {
        info!("Stopping {}", self.engine);
        let script = format!("quit app \"{}\"", self.engine.app_name());
        command::run_best_effort("osascript", &["-e", &script]).await;
        self.confirm_stopped().await;
    }
}
