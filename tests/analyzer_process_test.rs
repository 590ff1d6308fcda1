//! External analyzer lifecycle tests
//!
//! Drive real child processes through `sh -c` scripts. The subject is
//! appended after `$0`, so scripts see it as `$1`.

#![cfg(target_os = "linux")]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use threatscope::core::{AnalysisResult, ExternalAnalyzer};
use threatscope::models::{
    AnalysisKind, AnalysisRequest, AnalysisSource, AnalyzerCommand, AnalyzerFailure, AnalyzerOutcome,
    EngineConfig,
};
use threatscope::utils::constants::FALLBACK_NOTE;
use threatscope::{Orchestrator, TelemetryCollector};

fn script(body: &str) -> AnalyzerCommand {
    AnalyzerCommand::new("sh", ["-c", body, "analyzer"])
}

fn config_with(url_analyzer: AnalyzerCommand) -> EngineConfig {
    EngineConfig {
        url_analyzer: Some(url_analyzer),
        network_analyzer: None,
        url_deadline: Duration::from_secs(1),
        ..EngineConfig::default()
    }
}

fn pid_file() -> PathBuf {
    std::env::temp_dir().join(format!("threatscope-{}.pid", uuid::Uuid::new_v4()))
}

/// Script that records its pid and then never exits on its own
fn sleeper(pid_path: &PathBuf) -> AnalyzerCommand {
    script(&format!("echo $$ > {}; exec sleep 30", pid_path.display()))
}

fn read_pid(path: &PathBuf) -> u32 {
    std::fs::read_to_string(path)
        .expect("pid file written")
        .trim()
        .parse()
        .expect("pid is numeric")
}

/// Running, as opposed to missing or a zombie waiting to be reaped
fn is_running(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit_once(") ")
            .map(|(_, rest)| !rest.starts_with('Z') && !rest.starts_with('X'))
            .unwrap_or(false),
        Err(_) => false,
    }
}

async fn wait_until_gone(pid: u32) -> bool {
    for _ in 0..40 {
        if !is_running(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_successful_analyzer_passes_payload_through() {
    let config = config_with(script(r#"printf '{"threat_score": 97, "subject": "%s"}' "$1""#));
    let orchestrator = Orchestrator::new(Arc::new(config), Arc::new(TelemetryCollector::new()));

    let request = AnalysisRequest::url("https://example.com").unwrap();
    let response = orchestrator.handle(&request).await;

    assert_eq!(response.source, AnalysisSource::External);
    assert!(response.note.is_none());
    assert_eq!(
        response.result,
        AnalysisResult::External(serde_json::json!({
            "threat_score": 97,
            "subject": "https://example.com",
        }))
    );
}

#[tokio::test]
async fn test_non_zero_exit_falls_back_with_note() {
    let config = config_with(script("echo 'scanner exploded' >&2; exit 2"));
    let analyzer = ExternalAnalyzer::new(Arc::new(config.clone()));

    let outcome = analyzer
        .invoke("https://example.com", AnalysisKind::Url, Duration::from_secs(5))
        .await;
    assert_eq!(
        outcome,
        AnalyzerOutcome::Failure(AnalyzerFailure::NonZeroExit {
            code: Some(2),
            stderr: "scanner exploded".to_string(),
        })
    );

    let telemetry = Arc::new(TelemetryCollector::new());
    let orchestrator = Orchestrator::new(Arc::new(config), telemetry.clone());
    let response = orchestrator
        .handle(&AnalysisRequest::url("https://example.com").unwrap())
        .await;
    assert_eq!(response.source, AnalysisSource::Fallback);
    assert_eq!(response.note.as_deref(), Some(FALLBACK_NOTE));
    assert_eq!(telemetry.get_stats().failures_by_reason.get("non_zero_exit"), Some(&1));
}

#[tokio::test]
async fn test_unstructured_stdout_is_malformed() {
    let analyzer = ExternalAnalyzer::new(Arc::new(config_with(script("echo 'scan complete: ok'"))));
    let outcome = analyzer
        .invoke("https://example.com", AnalysisKind::Url, Duration::from_secs(5))
        .await;
    assert!(matches!(
        outcome,
        AnalyzerOutcome::Failure(AnalyzerFailure::MalformedOutput(_))
    ));
}

#[tokio::test]
async fn test_missing_binary_is_spawn_error() {
    let command = AnalyzerCommand::new("/nonexistent/threatscope-analyzer", Vec::<String>::new());
    let analyzer = ExternalAnalyzer::new(Arc::new(config_with(command)));

    let start = Instant::now();
    let outcome = analyzer
        .invoke("https://example.com", AnalysisKind::Url, Duration::from_secs(5))
        .await;
    assert!(matches!(
        outcome,
        AnalyzerOutcome::Failure(AnalyzerFailure::SpawnError(_))
    ));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_oversized_output_is_rejected() {
    let mut config = config_with(script("printf '%0100d' 0"));
    config.max_output_bytes = 16;
    let analyzer = ExternalAnalyzer::new(Arc::new(config));

    let outcome = analyzer
        .invoke("https://example.com", AnalysisKind::Url, Duration::from_secs(5))
        .await;
    assert!(matches!(
        outcome,
        AnalyzerOutcome::Failure(AnalyzerFailure::MalformedOutput(_))
    ));
}

#[tokio::test]
async fn test_oversized_stderr_is_truncated() {
    let mut config = config_with(script("printf '%0100d' 0 >&2; exit 3"));
    config.max_output_bytes = 16;
    let analyzer = ExternalAnalyzer::new(Arc::new(config));

    let outcome = analyzer
        .invoke("https://example.com", AnalysisKind::Url, Duration::from_secs(5))
        .await;
    assert_eq!(
        outcome,
        AnalyzerOutcome::Failure(AnalyzerFailure::NonZeroExit {
            code: Some(3),
            stderr: "0".repeat(16),
        })
    );
}

#[tokio::test]
async fn test_noisy_stderr_does_not_spoil_success() {
    let mut config = config_with(script(r#"printf '%0100d' 0 >&2; echo '{"verdict":"clean"}'"#));
    config.max_output_bytes = 32;
    let analyzer = ExternalAnalyzer::new(Arc::new(config));

    let outcome = analyzer
        .invoke("https://example.com", AnalysisKind::Url, Duration::from_secs(5))
        .await;
    assert_eq!(
        outcome,
        AnalyzerOutcome::Success(serde_json::json!({"verdict": "clean"}))
    );
}

#[tokio::test]
async fn test_unbounded_output_cap() {
    let mut config = config_with(script(r#"echo '{"ok":1}'"#));
    config.max_output_bytes = usize::MAX;
    let analyzer = ExternalAnalyzer::new(Arc::new(config));

    let outcome = analyzer
        .invoke("https://example.com", AnalysisKind::Url, Duration::from_secs(5))
        .await;
    assert_eq!(outcome, AnalyzerOutcome::Success(serde_json::json!({"ok": 1})));
}

#[tokio::test]
async fn test_hung_analyzer_is_killed_at_deadline() {
    let pid_path = pid_file();
    let telemetry = Arc::new(TelemetryCollector::new());
    let orchestrator = Orchestrator::new(Arc::new(config_with(sleeper(&pid_path))), telemetry.clone());

    let start = Instant::now();
    let response = orchestrator
        .handle(&AnalysisRequest::url("https://example.com").unwrap())
        .await;
    let elapsed = start.elapsed();

    assert_eq!(response.source, AnalysisSource::Fallback);
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
    assert_eq!(telemetry.get_stats().failures_by_reason.get("timeout"), Some(&1));

    let pid = read_pid(&pid_path);
    assert!(!is_running(pid), "analyzer {} survived its deadline", pid);
    let _ = std::fs::remove_file(&pid_path);
}

#[tokio::test]
async fn test_cancelled_request_kills_analyzer_without_fallback() {
    let pid_path = pid_file();
    let mut config = config_with(sleeper(&pid_path));
    config.url_deadline = Duration::from_secs(30);
    let telemetry = Arc::new(TelemetryCollector::new());
    let orchestrator = Orchestrator::new(Arc::new(config), telemetry.clone());

    let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = cancel_tx.send(());
    });

    let start = Instant::now();
    let request = AnalysisRequest::url("https://example.com").unwrap();
    let response = orchestrator
        .handle_until(&request, async {
            let _ = cancel_rx.await;
        })
        .await;

    assert!(response.is_none());
    assert!(start.elapsed() < Duration::from_secs(5));

    let stats = telemetry.get_stats();
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.fallback_results, 0);

    let pid = read_pid(&pid_path);
    assert!(wait_until_gone(pid).await, "analyzer {} outlived its request", pid);
    let _ = std::fs::remove_file(&pid_path);
}

#[tokio::test]
async fn test_spawns_are_bounded() {
    let mut config = config_with(script("sleep 0.5; echo '{}'"));
    config.max_concurrent_spawns = 1;
    let analyzer = ExternalAnalyzer::new(Arc::new(config));
    assert_eq!(analyzer.available_permits(), 1);

    let start = Instant::now();
    let deadline = Duration::from_secs(5);
    let (a, b) = tokio::join!(
        analyzer.invoke("https://a.example", AnalysisKind::Url, deadline),
        analyzer.invoke("https://b.example", AnalysisKind::Url, deadline),
    );

    assert!(a.is_success());
    assert!(b.is_success());
    // one at a time: the second run starts after the first exits
    assert!(start.elapsed() >= Duration::from_millis(900));
    assert_eq!(analyzer.available_permits(), 1);
}
