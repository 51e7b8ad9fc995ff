/*!
 * PDP - Main Entry Point
 *
 * Line-oriented decision service:
 * - Loads the policy and content documents named by the environment
 * - Reads one JSON request object per line on stdin
 * - Writes one JSON response per line on stdout
 * - Reloads the policy document on SIGHUP through the staging protocol
 */

use anyhow::Context as _;
use pdp::{init_tracing, Pdp, PdpConfig, SerializableError};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

#[derive(Serialize)]
struct ErrorLine {
    error: SerializableError,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PdpConfig::from_env();
    init_tracing(config.trace_json);

    info!("PDP starting...");
    info!(
        policy = ?config.policy_path,
        contents = config.content_paths.len(),
        max_staged = config.max_staged,
        max_upload_bytes = config.max_upload_bytes,
        slow_decision_ms = config.slow_decision.as_millis() as u64,
        "Configuration loaded"
    );

    let pdp = Arc::new(Pdp::load(config).context("failed to load initial documents")?);
    info!(policy_tag = ?pdp.policy_tag(), "PDP ready, reading requests from stdin");

    serve(pdp).await
}

async fn serve(pdp: Arc<Pdp>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut reloads = reload_signal()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    info!("stdin closed, shutting down");
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                let mut out = answer(&pdp, line.as_bytes())?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await.context("failed to write response")?;
                stdout.flush().await.context("failed to flush stdout")?;
            }
            Some(()) = next_reload(&mut reloads) => {
                reload_policy(&pdp).await;
            }
        }
    }
}

/// Decide one request line, rendering failures as an error object
fn answer(pdp: &Pdp, line: &[u8]) -> anyhow::Result<String> {
    let rendered = match pdp.decide_json(line) {
        Ok(response) => serde_json::to_string(&response),
        Err(err) => {
            warn!(error = %err, "Rejected request");
            serde_json::to_string(&ErrorLine { error: err.into() })
        }
    };
    rendered.context("failed to render response")
}

/// Replace the policy with the configured document
async fn reload_policy(pdp: &Pdp) {
    let Some(path) = pdp.config().policy_path.clone() else {
        warn!("SIGHUP received but no policy path is configured");
        return;
    };
    match stage_file(pdp, &path).await {
        Ok(tag) => info!(path = %path.display(), tag = ?tag, "Policy reloaded"),
        Err(err) => error!(path = %path.display(), error = %err, "Policy reload failed, keeping current policy"),
    }
}

async fn stage_file(pdp: &Pdp, path: &Path) -> anyhow::Result<Option<uuid::Uuid>> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let id = pdp.stage_policy(None, None)?;
    if let Err(err) = pdp.upload(id, &data) {
        // Oversized uploads are already discarded
        let _ = pdp.abort(id);
        return Err(err.into());
    }
    Ok(pdp.apply(id)?)
}

#[cfg(unix)]
type ReloadSignal = tokio::signal::unix::Signal;

#[cfg(not(unix))]
type ReloadSignal = ();

#[cfg(unix)]
fn reload_signal() -> anyhow::Result<ReloadSignal> {
    use tokio::signal::unix::{signal, SignalKind};
    signal(SignalKind::hangup()).context("failed to install SIGHUP handler")
}

#[cfg(not(unix))]
fn reload_signal() -> anyhow::Result<ReloadSignal> {
    Ok(())
}

#[cfg(unix)]
async fn next_reload(signal: &mut ReloadSignal) -> Option<()> {
    signal.recv().await
}

#[cfg(not(unix))]
async fn next_reload(_signal: &mut ReloadSignal) -> Option<()> {
    std::future::pending().await
}
