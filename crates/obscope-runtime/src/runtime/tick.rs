//! Tick loop (spec §4.10, §5): one call to [`Daemon::tick`] runs Discovery,
//! refreshes the Parse Cache & Accumulator for every rollout it finds, and
//! hands the result to the Dashboard Builder. The caller (the CLI's daemon
//! run loop) drives this on a timer; this module has no notion of wall-clock
//! scheduling itself, so it can be driven deterministically in tests.

use crate::runtime::discovery::Discovery;
use chrono::{DateTime, Utc};
use obscope_core::{ProcessInspector, VcsAdapter};
use obscope_engine::{
    build_parsed_session, build_plan_history_entries, build_snapshot, FeedLog, ParseCache,
    SessionInput,
};
use obscope_index::DiscoveredSession;
use obscope_providers::ProviderAdapter;
use obscope_types::{Operator, OperatorId, Snapshot};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// One provider family's rollout root, plus the operator it belongs to (for
/// multi-operator setups configured via `OperatorConfig`).
pub struct WatchedRoot {
    pub provider_id: &'static str,
    pub log_root: PathBuf,
    pub operator_id: OperatorId,
}

/// Everything the tick loop needs that isn't pure computation: provider
/// adapters, OS/VCS adapters, and the per-tick mutable state (parse cache,
/// feed log, discovery's active-session memory, session labels).
pub struct Daemon {
    adapters: Vec<ProviderAdapter>,
    watched: Vec<WatchedRoot>,
    operators: Vec<Operator>,
    vcs: Box<dyn VcsAdapter>,
    inspector: Box<dyn ProcessInspector>,
    discovery: std::collections::HashMap<&'static str, Discovery>,
    parse_cache: ParseCache,
    feed: FeedLog,
    labels: obscope_index::LabelStore,
    plan_history: obscope_index::PlanHistoryIndex,
}

impl Daemon {
    pub fn new(
        adapters: Vec<ProviderAdapter>,
        watched: Vec<WatchedRoot>,
        operators: Vec<Operator>,
        vcs: Box<dyn VcsAdapter>,
        inspector: Box<dyn ProcessInspector>,
        labels_path: PathBuf,
        plan_history_path: PathBuf,
    ) -> Self {
        Self {
            adapters,
            watched,
            operators,
            vcs,
            inspector,
            discovery: std::collections::HashMap::new(),
            parse_cache: ParseCache::new(),
            feed: FeedLog::new(),
            labels: obscope_index::LabelStore::load(labels_path),
            plan_history: obscope_index::PlanHistoryIndex::load(plan_history_path),
        }
    }

    fn adapter_for(&self, provider_id: &str) -> Option<&ProviderAdapter> {
        self.adapters.iter().find(|a| a.discovery.id() == provider_id)
    }

    /// Run one tick: discover rollouts on every watched root, refresh the
    /// parse cache for each, and build the Snapshot. Returns `None` only if
    /// every rollout failed to parse (the Snapshot is still built in that
    /// case; `None` is never actually returned — kept `Result`-shaped so a
    /// future fatal condition has somewhere to surface to).
    pub fn tick(&mut self, now: DateTime<Utc>) -> Snapshot {
        let mut inputs_data: Vec<(String, obscope_types::ParsedSession, obscope_types::SessionAccumulator, OperatorId, String, bool)> =
            Vec::new();
        let mut current_ids: BTreeSet<String> = BTreeSet::new();

        for root in &self.watched {
            let Some(adapter) = self.adapter_for(root.provider_id) else {
                tracing::warn!(provider = root.provider_id, "no adapter registered for watched root");
                continue;
            };

            let discovery = self.discovery.entry(root.provider_id).or_insert_with(Discovery::new);
            let rollouts = match discovery.discover(adapter.discovery.as_ref(), &root.log_root, self.inspector.as_ref(), now) {
                Ok(rollouts) => rollouts,
                Err(err) => {
                    tracing::warn!(provider = root.provider_id, error = %err, "discovery failed for this tick");
                    continue;
                }
            };

            for rollout in rollouts {
                current_ids.insert(rollout.session_id.clone());

                let metadata = match std::fs::metadata(&rollout.path) {
                    Ok(m) => m,
                    Err(err) => {
                        tracing::debug!(path = %rollout.path.display(), error = %err, "rollout vanished mid-tick");
                        continue;
                    }
                };
                let mtime_ms = rollout
                    .modified_at
                    .timestamp_millis();
                let size_bytes = metadata.len();

                let session_id = rollout.session_id.clone();
                let path = rollout.path.clone();
                let provider_id = adapter.discovery.id();

                let refreshed = self.parse_cache.refresh(&session_id, mtime_ms, size_bytes, || {
                    parse_rollout(adapter, &session_id, &path, provider_id, rollout.modified_at)
                });

                let label = self.labels.assign(&session_id, now);
                inputs_data.push((
                    session_id,
                    refreshed.session.clone(),
                    refreshed.accumulator.clone(),
                    root.operator_id.clone(),
                    label,
                    rollout.active,
                ));
            }
        }

        self.parse_cache.evict_missing(&current_ids);
        self.labels.reclaim(now);
        self.labels.persist();

        let inputs: Vec<SessionInput<'_>> = inputs_data
            .iter()
            .map(|(_, session, accumulator, operator_id, label, active)| SessionInput {
                session,
                accumulator,
                operator_id: operator_id.clone(),
                label: label.clone(),
                active: *active,
            })
            .collect();

        self.refresh_plan_history(&inputs_data, now);

        build_snapshot(&inputs, self.operators.clone(), self.vcs.as_ref(), &mut self.feed, now)
    }

    /// Plan History Index refresh (§4.9): runs every tick but is internally
    /// throttled to at most once per 15s, so it's effectively "its own
    /// schedule" riding on the same loop rather than a second discovery pass.
    fn refresh_plan_history(
        &mut self,
        inputs_data: &[(
            String,
            obscope_types::ParsedSession,
            obscope_types::SessionAccumulator,
            OperatorId,
            String,
            bool,
        )],
        now: DateTime<Utc>,
    ) {
        let discovered: Vec<obscope_index::DiscoveredSession> = inputs_data
            .iter()
            .map(|(id, session, _, _, _, _)| obscope_index::DiscoveredSession {
                session_id: id.clone(),
                path: session.rollout_path.clone(),
                project_path: session.project_path.clone(),
                agent_family: session.agent_family.clone(),
                mtime_ms: session.modified_at.timestamp_millis(),
                size_bytes: session.size_bytes,
                created_at: session.created_at,
                modified_at: session.modified_at,
            })
            .collect();

        self.plan_history.refresh(&discovered, now, false, |d| {
            inputs_data
                .iter()
                .find(|(id, ..)| id == &d.session_id)
                .map(|(_, session, ..)| build_plan_history_entries(session))
                .unwrap_or_default()
        });
    }

    /// Read access to the Plan History Index for list/query callers (CLI,
    /// future HTTP adapters).
    pub fn plan_history(&self) -> &obscope_index::PlanHistoryIndex {
        &self.plan_history
    }
}

/// Parse one rollout file into a `ParsedSession`, degrading to an empty
/// session (no turns) on a parse failure — per-entity errors drop just this
/// entity, per §7, while the rest of the tick proceeds.
fn parse_rollout(
    adapter: &ProviderAdapter,
    session_id: &str,
    path: &std::path::Path,
    provider_id: &'static str,
    modified_at: DateTime<Utc>,
) -> obscope_types::ParsedSession {
    let events = match adapter.parser.parse_file(path) {
        Ok(events) => events,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "rollout parse failed, reporting empty session");
            Vec::new()
        }
    };

    let assembled = obscope_engine::assemble_session(&events);
    let project_path = path.parent().map(|p| p.display().to_string()).unwrap_or_default();
    let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let created_at = events.first().map(|e| e.timestamp).unwrap_or(modified_at);

    match assembled {
        Some(assembled) => build_parsed_session(
            session_id.to_string(),
            project_path,
            provider_id.to_string(),
            path.to_path_buf(),
            created_at,
            modified_at,
            size_bytes,
            &assembled,
        ),
        None => obscope_types::ParsedSession {
            id: session_id.to_string(),
            project_path,
            agent_family: provider_id.to_string(),
            rollout_path: path.to_path_buf(),
            created_at,
            modified_at,
            size_bytes,
            turns: Vec::new(),
        },
    }
}
