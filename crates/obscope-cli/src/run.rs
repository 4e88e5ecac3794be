//! Wires the daemon together: load config, build adapters, drive the tick
//! loop, and fan out each changed Snapshot (spec §4.10). The HTTP/SSE
//! transport a real UI client would speak, and the uplink's WebSocket
//! transport, are both external adapters per §6 (out of scope for the
//! core) — this process persists the latest Snapshot to
//! `<data-dir>/snapshot.json` instead, so `obscope status` has something to
//! read without needing a running subscriber.

use anyhow::{Context, Result};
use chrono::Utc;
use obscope_core::{AesGcmCipher, GitVcsAdapter, LsofProcessInspector, NullCipher, SecretCipher};
use obscope_runtime::{expand_operators, Daemon, OperatorConfig, RelayConfig, SnapshotBus};
use obscope_types::Snapshot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

fn workspace_dir(explicit: &Option<String>) -> Result<PathBuf> {
    let path = obscope_runtime::resolve_workspace_path(explicit.as_deref())
        .context("resolving workspace data directory")?;
    std::fs::create_dir_all(&path)
        .with_context(|| format!("creating workspace directory {}", path.display()))?;
    Ok(path)
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Secrets cipher for relay tokens: a 32-byte key file under the workspace
/// dir, falling back to `OBSCOPE_RELAY_KEY` (base64) on first run, per §6.
/// Never used to decide whether uplinks are configured — an empty
/// `RelayConfig` is a perfectly normal, uplink-free daemon.
fn load_cipher(data_dir: &Path) -> Arc<dyn SecretCipher> {
    let key_path = data_dir.join("relay.key");
    match AesGcmCipher::from_key_file_or_env(&key_path, "OBSCOPE_RELAY_KEY") {
        Ok(cipher) => Arc::new(cipher),
        Err(err) => {
            tracing::warn!(error = %err, "no relay key available, uplink secrets stored in plaintext");
            Arc::new(NullCipher)
        }
    }
}

pub async fn run(data_dir: &Option<String>, log_level: &crate::args::LogLevel) -> Result<()> {
    init_tracing(log_level.as_str());
    let data_dir = workspace_dir(data_dir)?;

    let operator_config = OperatorConfig::load().unwrap_or_default();
    let relay_config = RelayConfig::load().unwrap_or_default();
    let cipher = load_cipher(&data_dir);
    for target in &relay_config.targets {
        match target.resolve_token(cipher.as_ref()) {
            Ok(_) => tracing::info!(pylon = %target.pylon_id, url = %target.ws_url, "relay uplink configured"),
            Err(err) => tracing::warn!(pylon = %target.pylon_id, error = %err, "relay uplink has no usable token, skipping"),
        }
    }

    let default_paths: std::collections::HashMap<String, PathBuf> =
        obscope_providers::get_default_log_paths().into_iter().collect();
    let (operators, watched) = expand_operators(
        &operator_config,
        default_paths.get("claude_code").cloned(),
        default_paths.get("codex").cloned(),
    );

    let mut daemon = Daemon::new(
        obscope_providers::create_all_adapters(),
        watched,
        operators,
        Box::new(GitVcsAdapter),
        Box::new(LsofProcessInspector),
        data_dir.join("labels.json"),
        data_dir.join("plan-history.json"),
    );

    let snapshot_path = data_dir.join("snapshot.json");
    let mut bus = SnapshotBus::new();
    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let snapshot = daemon.tick(now);
                // Push idempotence (§8 property 7): only persist when the
                // snapshot actually changed from what was last pushed.
                if let Some(message) = bus.publish(&snapshot, now) {
                    persist_snapshot(&snapshot_path, &message.snapshot);
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

fn persist_snapshot(path: &Path, snapshot: &Snapshot) {
    match serde_json::to_vec_pretty(snapshot) {
        Ok(bytes) => {
            if let Err(err) = std::fs::write(path, bytes) {
                tracing::warn!(error = %err, path = %path.display(), "failed to persist snapshot");
            }
        }
        Err(err) => tracing::warn!(error = %err, "failed to serialize snapshot"),
    }
}

pub fn status(data_dir: &Option<String>) -> Result<()> {
    let data_dir = obscope_runtime::resolve_workspace_path(data_dir.as_deref())?;
    let snapshot_path = data_dir.join("snapshot.json");
    if !snapshot_path.exists() {
        println!("no snapshot yet (is the daemon running?)");
        return Ok(());
    }

    let bytes = std::fs::read(&snapshot_path)
        .with_context(|| format!("reading {}", snapshot_path.display()))?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes).context("parsing snapshot.json")?;

    println!("agents: {}", snapshot.agents.len());
    println!("workstreams: {}", snapshot.workstreams.len());
    println!("collisions: {}", snapshot.collisions.len());
    println!(
        "active: {} | at-risk workstreams: {} | aggregate cost: ${:.2}",
        snapshot.summary.active_count, snapshot.summary.workstreams_at_risk, snapshot.summary.aggregate_cost
    );
    for event in snapshot.feed.iter().take(10) {
        println!("  [{}] {}: {}", event.timestamp.to_rfc3339(), event.session_id, event.summary);
    }

    Ok(())
}
