//! Shell-pipeline execution for the scraping sources

use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Run a shell pipeline and capture its stdout.
pub(crate) async fn capture(pipeline: &str) -> std::io::Result<String> {
    debug!("Scraping: {}", pipeline);

    let output = Command::new("sh")
        .arg("-c")
        .arg(pipeline)
        .stdin(Stdio::null())
        .output()
        .await?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(std::io::Error::other(format!(
            "pipeline exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}
