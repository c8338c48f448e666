//! Installation check for the eSpeak-NG binary

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::core::health::EngineHealth;

/// Default bound on the `--version` query
pub const DEFAULT_VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Run `<binary> --version` with output suppressed.
///
/// Returns `false` when the binary cannot be spawned, exits non-zero or does
/// not finish within `timeout`; in that case `health`, if given, is marked
/// degraded.
pub async fn is_engine_available(
    binary: &str,
    timeout: Duration,
    health: Option<&EngineHealth>,
) -> bool {
    let result = tokio::time::timeout(
        timeout,
        Command::new(binary)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status(),
    )
    .await;

    let failure = match result {
        Ok(Ok(status)) if status.success() => {
            tracing::debug!("{} --version succeeded", binary);
            return true;
        }
        Ok(Ok(status)) => format!("{binary} --version exited with {status}"),
        Ok(Err(e)) => format!("failed to run {binary}: {e}"),
        Err(_) => format!("{binary} --version timed out after {timeout:?}"),
    };

    tracing::error!("eSpeak check failed: {}", failure);
    if let Some(health) = health {
        health.mark_degraded(failure);
    }
    false
}
