//! Scriptable mock engine adapter for testing
//!
//! Drives no real processes: lifecycle state lives in memory, and
//! readiness is scripted per start command. All time goes through
//! `tokio::time`, so tests can run under paused time.

use crate::adapter::EngineAdapter;
use crate::{EngineError, Result};
use async_trait::async_trait;
use berth_core::Engine;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[derive(Debug)]
struct MockState {
    running: bool,
    workload_up: bool,
    /// Scripted readiness per start: `Some(d)` becomes ready `d` after
    /// the start command, `None` never becomes ready
    ready_script: VecDeque<Option<Duration>>,
    started_at: Option<Instant>,
    current_delay: Option<Duration>,
    fail_workload_start: bool,
    calls: Vec<String>,
}

/// Mock engine adapter with scriptable readiness and failure injection
#[derive(Clone)]
pub struct MockEngineAdapter {
    engine: Engine,
    state: Arc<Mutex<MockState>>,
}

impl MockEngineAdapter {
    /// Create a mock that becomes ready immediately on every start
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            state: Arc::new(Mutex::new(MockState {
                running: false,
                workload_up: false,
                ready_script: VecDeque::new(),
                started_at: None,
                current_delay: Some(Duration::ZERO),
                fail_workload_start: false,
                calls: Vec::new(),
            })),
        }
    }

    /// Script readiness for the next start commands, in order.
    ///
    /// Starts beyond the script fall back to immediate readiness.
    pub fn script_ready(&self, delays: impl IntoIterator<Item = Option<Duration>>) {
        let mut state = self.state.lock().unwrap();
        state.ready_script = delays.into_iter().collect();
    }

    /// Make every workload start fail
    pub fn fail_workload_start(&self) {
        self.state.lock().unwrap().fail_workload_start = true;
    }

    /// Whether a workload is currently up
    pub fn workload_up(&self) -> bool {
        self.state.lock().unwrap().workload_up
    }

    /// The recorded operation names, in call order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }

    fn ready_now(&self) -> bool {
        let state = self.state.lock().unwrap();
        match (state.started_at, state.current_delay) {
            (Some(at), Some(delay)) => at.elapsed() >= delay,
            _ => false,
        }
    }
}

#[async_trait]
impl EngineAdapter for MockEngineAdapter {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("start".to_string());
        state.running = true;
        state.started_at = Some(Instant::now());
        state.current_delay = state
            .ready_script
            .pop_front()
            .unwrap_or(Some(Duration::ZERO));
        Ok(())
    }

    async fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        state.calls.push("stop".to_string());
        state.running = false;
        state.started_at = None;
    }

    async fn check_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.ready_now() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_secs(1)).await;
        }
    }

    async fn compose_up(&self, _file: Option<&Path>) -> Result<()> {
        self.record("compose_up");
        let mut state = self.state.lock().unwrap();
        if state.fail_workload_start {
            return Err(mock_failure("compose up"));
        }
        state.workload_up = true;
        Ok(())
    }

    async fn compose_down(&self, _file: Option<&Path>) {
        self.record("compose_down");
        self.state.lock().unwrap().workload_up = false;
    }

    async fn start_stress(&self, _duration: Duration) -> Result<()> {
        self.record("start_stress");
        let mut state = self.state.lock().unwrap();
        if state.fail_workload_start {
            return Err(mock_failure("run stress"));
        }
        state.workload_up = true;
        Ok(())
    }

    async fn remove_stress(&self) {
        self.record("remove_stress");
        self.state.lock().unwrap().workload_up = false;
    }

    async fn capture_info(&self) -> String {
        format!("mock info for {}\n", self.engine)
    }

    async fn workload_logs(&self) -> Option<String> {
        Some("mock workload logs\n".to_string())
    }
}

fn mock_failure(what: &str) -> EngineError {
    EngineError::Command {
        command: format!("mock {}", what),
        status: Some(1),
        stderr: "injected failure".to_string(),
    }
}
