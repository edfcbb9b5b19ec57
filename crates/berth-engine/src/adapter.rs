//! Engine adapter interface and factory

use crate::command;
use crate::Result;
use async_trait::async_trait;
use berth_core::Engine;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Seconds granted to an engine to terminate after its stop command
const STOP_CONFIRM_SECS: u32 = 30;

/// Interval between readiness probes
const READY_POLL: Duration = Duration::from_secs(1);

/// Trait defining the capability set of a container engine under test.
///
/// One concrete adapter exists per engine variant; callers obtain one
/// through [`adapter_for`] and never branch on the engine id themselves.
/// Workload and readiness capabilities are shared default implementations
/// driven by the engine's lookup tables; adapters override only where
/// their engine genuinely deviates.
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// The engine this adapter drives
    fn engine(&self) -> Engine;

    /// Whether the engine is currently running
    async fn is_running(&self) -> bool;

    /// Issue the engine's native start command.
    ///
    /// Returns once the command is issued; readiness is probed
    /// separately via [`check_ready`](EngineAdapter::check_ready).
    async fn start(&self) -> Result<()>;

    /// Issue the engine's native stop command and confirm termination.
    ///
    /// Best-effort: a process still alive after the confirmation window
    /// is logged, not an error.
    async fn stop(&self);

    /// Poll `is_running` until the engine terminates or the bound elapses
    async fn confirm_stopped(&self) {
        for _ in 0..STOP_CONFIRM_SECS {
            if !self.is_running().await {
                return;
            }
            sleep(Duration::from_secs(1)).await;
        }
        warn!(
            "{} still running {}s after stop command",
            self.engine(),
            STOP_CONFIRM_SECS
        );
    }

    /// Poll the engine's basic introspection and listing commands until
    /// both succeed or the timeout elapses.
    ///
    /// Never errors; a missing client binary simply reads as not ready.
    async fn check_ready(&self, timeout: Duration) -> bool {
        let cli = self.engine().cli();
        let deadline = tokio::time::Instant::now() + timeout;

        while tokio::time::Instant::now() < deadline {
            if command::succeeds(cli, &["info"]).await && command::succeeds(cli, &["ps"]).await {
                return true;
            }
            debug!("Waiting for {} to be ready", self.engine());
            sleep(READY_POLL).await;
        }
        false
    }

    /// Compose command for this engine's idle stack.
    ///
    /// podman-desktop drives `podman compose`; every other engine uses
    /// the `docker compose` plugin. colima overrides this with the
    /// standalone `docker-compose` binary.
    fn compose_command(&self) -> Vec<String> {
        vec![self.engine().cli().to_string(), "compose".to_string()]
    }

    /// Bring up the declarative idle stack
    async fn compose_up(&self, file: Option<&Path>) -> Result<()> {
        let argv = self.compose_command();
        let mut args: Vec<&str> = argv.iter().skip(1).map(String::as_str).collect();
        let file_arg = file.map(|f| f.display().to_string());
        if let Some(ref f) = file_arg {
            args.push("-f");
            args.push(f);
        }
        args.push("up");
        args.push("-d");

        info!("Bringing up idle stack for {}", self.engine());
        command::run_checked(&argv[0], &args).await
    }

    /// Tear down the idle stack along with its volumes, best-effort
    async fn compose_down(&self, file: Option<&Path>) {
        let argv = self.compose_command();
        let mut args: Vec<&str> = argv.iter().skip(1).map(String::as_str).collect();
        let file_arg = file.map(|f| f.display().to_string());
        if let Some(ref f) = file_arg {
            args.push("-f");
            args.push(f);
        }
        args.push("down");
        args.push("-v");

        command::run_best_effort(&argv[0], &args).await;
    }

    /// Launch the synthetic CPU/memory stress container, bounded to the
    /// given lifetime
    async fn start_stress(&self, duration: Duration) -> Result<()> {
        let cli = self.engine().cli();
        let timeout = format!("{}s", duration.as_secs());

        info!("Starting stress workload for {}", self.engine());
        command::run_checked(
            cli,
            &[
                "run",
                "-d",
                "--name",
                self.engine().stress_container(),
                "alexeiled/stress-ng",
                "--cpu",
                "4",
                "--vm",
                "2",
                "--vm-bytes",
                "1G",
                "--timeout",
                &timeout,
            ],
        )
        .await
    }

    /// Remove the stress container, best-effort; absence is not an error
    async fn remove_stress(&self) {
        let cli = self.engine().cli();
        command::run_best_effort(cli, &["rm", "-f", self.engine().stress_container()]).await;
    }

    /// The engine's self-reported info, for diagnostic logs
    async fn capture_info(&self) -> String {
        match command::capture_stdout(self.engine().cli(), &["info"]).await {
            Ok(out) => out,
            Err(e) => format!("Error getting engine info: {}\n", e),
        }
    }

    /// Logs of the stress container, used to diagnose workload-start
    /// failures
    async fn workload_logs(&self) -> Option<String> {
        command::capture_stdout(
            self.engine().cli(),
            &["logs", self.engine().stress_container()],
        )
        .await
        .ok()
    }
}

/// Create the adapter for an engine
pub fn adapter_for(engine: Engine) -> Box<dyn EngineAdapter> {
    match engine {
        Engine::Colima => Box::new(crate::colima::Colima::new()),
        other => Box::new(crate::desktop::DesktopApp::new(other)),
    }
}
