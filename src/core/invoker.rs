//! External Analyzer Invoker
//!
//! Runs one out-of-process analyzer per request and turns whatever happens
//! into exactly one [`AnalyzerOutcome`]:
//! - spawn failure            → `SpawnError` (no deadline consumed)
//! - exit != 0                → `NonZeroExit` with stderr
//! - exit 0, stdout not JSON  → `MalformedOutput`
//! - stdout over the cap      → `MalformedOutput`, child killed
//! - deadline fires first     → `Timeout`, child killed and reaped
//!
//! Children are spawned with `kill_on_drop`, so a caller that drops the
//! future (client disconnect, cancellation, panic unwinding) also kills the
//! process. No retries happen here or anywhere else.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::models::{AnalysisKind, AnalyzerCommand, AnalyzerFailure, AnalyzerOutcome, EngineConfig};

/// Spawns analyzer processes under a concurrency bound
pub struct ExternalAnalyzer {
    config: Arc<EngineConfig>,
    spawn_permits: Arc<Semaphore>,
}

impl ExternalAnalyzer {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let permits = config.max_concurrent_spawns.max(1);
        Self {
            config,
            spawn_permits: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Processes that could be spawned right now
    pub fn available_permits(&self) -> usize {
        self.spawn_permits.available_permits()
    }

    /// Run the analyzer configured for `kind` against `subject`
    ///
    /// Waiting for a spawn permit counts against `deadline`.
    pub async fn invoke(&self, subject: &str, kind: AnalysisKind, deadline: Duration) -> AnalyzerOutcome {
        let Some(command) = self.config.analyzer_for(kind) else {
            return AnalyzerOutcome::Failure(AnalyzerFailure::SpawnError(format!(
                "no analyzer configured for {}",
                kind.as_str()
            )));
        };

        let started = Instant::now();
        let _permit = match tokio::time::timeout(deadline, self.spawn_permits.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return AnalyzerOutcome::Failure(AnalyzerFailure::SpawnError(
                    "spawn limiter closed".to_string(),
                ))
            }
            Err(_) => return AnalyzerOutcome::Failure(AnalyzerFailure::Timeout(deadline)),
        };

        let remaining = deadline.saturating_sub(started.elapsed());
        run(command, subject, remaining, self.config.max_output_bytes).await
    }
}

/// Everything the child left behind once it exited
struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

#[derive(Debug)]
enum CaptureError {
    Overflow,
    Io(std::io::Error),
}

async fn run(command: &AnalyzerCommand, subject: &str, deadline: Duration, cap: usize) -> AnalyzerOutcome {
    let spawned = Command::new(&command.program)
        .args(&command.args)
        .arg(subject)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            return AnalyzerOutcome::Failure(AnalyzerFailure::SpawnError(format!(
                "{}: {}",
                command.program.display(),
                e
            )))
        }
    };

    debug!(pid = ?child.id(), program = %command.program.display(), "Analyzer spawned");

    let result = tokio::time::timeout(deadline, capture(&mut child, cap)).await;
    match result {
        Ok(Ok(captured)) => interpret(captured),
        Ok(Err(CaptureError::Overflow)) => {
            terminate(&mut child).await;
            AnalyzerOutcome::Failure(AnalyzerFailure::MalformedOutput(format!(
                "output exceeded {} bytes",
                cap
            )))
        }
        Ok(Err(CaptureError::Io(e))) => {
            terminate(&mut child).await;
            AnalyzerOutcome::Failure(AnalyzerFailure::MalformedOutput(format!(
                "failed to read analyzer output: {}",
                e
            )))
        }
        Err(_) => {
            terminate(&mut child).await;
            AnalyzerOutcome::Failure(AnalyzerFailure::Timeout(deadline))
        }
    }
}

/// Drain both pipes while waiting for exit; pipes must be drained
/// concurrently or a chatty child blocks on a full pipe buffer.
async fn capture(child: &mut Child, cap: usize) -> Result<Captured, CaptureError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr, status) = tokio::try_join!(
        read_capped(stdout, cap),
        read_truncated(stderr, cap),
        async { child.wait().await.map_err(CaptureError::Io) },
    )?;

    Ok(Captured {
        status,
        stdout,
        stderr,
    })
}

async fn read_capped<R: AsyncRead + Unpin>(stream: Option<R>, cap: usize) -> Result<Vec<u8>, CaptureError> {
    let Some(stream) = stream else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::new();
    let mut limited = stream.take((cap as u64).saturating_add(1));
    limited.read_to_end(&mut buf).await.map_err(CaptureError::Io)?;

    if buf.len() > cap {
        return Err(CaptureError::Overflow);
    }
    Ok(buf)
}

/// Keep the first `cap` bytes and discard the rest; diagnostics never
/// turn an exit status into an overflow
async fn read_truncated<R: AsyncRead + Unpin>(stream: Option<R>, cap: usize) -> Result<Vec<u8>, CaptureError> {
    let Some(mut stream) = stream else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::new();
    (&mut stream)
        .take(cap as u64)
        .read_to_end(&mut buf)
        .await
        .map_err(CaptureError::Io)?;
    tokio::io::copy(&mut stream, &mut tokio::io::sink())
        .await
        .map_err(CaptureError::Io)?;
    Ok(buf)
}

/// SIGKILL and reap
async fn terminate(child: &mut Child) {
    let pid = child.id();
    match child.kill().await {
        Ok(()) => debug!(pid = ?pid, "Analyzer killed"),
        Err(e) => warn!(pid = ?pid, error = %e, "Failed to kill analyzer"),
    }
}

fn interpret(captured: Captured) -> AnalyzerOutcome {
    if !captured.status.success() {
        return AnalyzerOutcome::Failure(AnalyzerFailure::NonZeroExit {
            code: captured.status.code(),
            stderr: String::from_utf8_lossy(&captured.stderr).trim().to_string(),
        });
    }

    match serde_json::from_slice::<serde_json::Value>(&captured.stdout) {
        Ok(value) if value.is_object() => AnalyzerOutcome::Success(value),
        Ok(_) => AnalyzerOutcome::Failure(AnalyzerFailure::MalformedOutput(
            "expected a JSON object".to_string(),
        )),
        Err(e) => AnalyzerOutcome::Failure(AnalyzerFailure::MalformedOutput(e.to_string())),
    }
}
