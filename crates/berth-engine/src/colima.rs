//! Adapter for colima
//!
//! colima has no desktop application: lifecycle goes through its own CLI
//! (`colima start|stop|status`), and liveness is read from the status
//! output rather than the process table. Workloads run through the docker
//! client against colima's VM, with the standalone `docker-compose`
//! binary for the idle stack.

use crate::adapter::EngineAdapter;
use crate::{command, Result};
use async_trait::async_trait;
use berth_core::Engine;
use tracing::info;

/// Adapter for the colima CLI-managed engine
pub struct Colima;

impl Colima {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Colima {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineAdapter for Colima {
    fn engine(&self) -> Engine {
        Engine::Colima
    }

    async fn is_running(&self) -> bool {
        // `colima status` writes its report to stderr on some versions,
        // so check both streams for the Running token.
        match command::capture_stdout("colima", &["status"]).await {
            Ok(out) => out.contains("Running"),
            Err(crate::EngineError::Command { stderr, .. }) => stderr.contains("Running"),
            Err(_) => false,
        }
    }

    async fn start(&self) -> Result<()> {
        info!("Starting colima");
        command::run_checked("colima", &["start"]).await
    }

    async fn stop(&self) {
        info!("Stopping colima");
        command::run_best_effort("colima", &["stop"]).await;
        self.confirm_stopped().await;
    }

    fn compose_command(&self) -> Vec<String> {
        vec!["docker-compose".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colima_uses_docker_client() {
        let adapter = Colima::new();
        assert_eq!(adapter.engine().cli(), "docker");
    }

    #[test]
    fn test_colima_compose_is_standalone_binary() {
        assert_eq!(Colima::new().compose_command(), vec!["docker-compose"]);
    }
}
