//! Plan History Index (spec §4.9): a single versioned JSON document caching
//! finalized plan cycles per session, refreshed incrementally and queried
//! with cursor pagination.

use crate::atomic::{read_json_lenient, write_json_atomic};
use base64::Engine;
use chrono::{DateTime, Utc};
use obscope_types::{PlanHistoryEntry, PlanStatus};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DOCUMENT_VERSION: u32 = 1;
const DEFAULT_PARSE_BUDGET: usize = 20;

/// A session as seen by discovery, before its plans are (re-)parsed.
#[derive(Debug, Clone)]
pub struct DiscoveredSession {
    pub session_id: String,
    pub path: PathBuf,
    pub project_path: String,
    pub agent_family: String,
    pub mtime_ms: i64,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionPlanEntry {
    key: String,
    session_id: String,
    path: PathBuf,
    project_path: String,
    agent_family: String,
    mtime_ms: i64,
    size_bytes: u64,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    plans: Vec<PlanHistoryEntry>,
}

impl SessionPlanEntry {
    fn matches(&self, discovered: &DiscoveredSession) -> bool {
        self.mtime_ms == discovered.mtime_ms
            && self.size_bytes == discovered.size_bytes
            && self.path == discovered.path
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PlanHistoryDocument {
    version: u32,
    updated_at: Option<DateTime<Utc>>,
    sessions: Vec<SessionPlanEntry>,
}

pub struct PlanHistoryIndex {
    path: PathBuf,
    document: PlanHistoryDocument,
    last_discovery: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct ListQuery {
    pub project_path: Option<String>,
    pub session_id: Option<String>,
    pub status: Option<PlanStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: usize,
    pub cursor: Option<String>,
}

pub struct ListResult {
    pub items: Vec<PlanHistoryEntry>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

pub struct SessionPlansView {
    pub session_id: String,
    pub project_path: String,
    pub agent_family: String,
    pub plans: Vec<PlanHistoryEntry>,
}

fn encode_cursor(timestamp_ms: i64, plan_id: &str) -> String {
    let raw = serde_json::json!({ "t": timestamp_ms, "id": plan_id }).to_string();
    base64::engine::general_purpose::STANDARD.encode(raw)
}

fn decode_cursor(cursor: &str) -> Option<(i64, String)> {
    let raw = base64::engine::general_purpose::STANDARD.decode(cursor).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&raw).ok()?;
    let t = value.get("t")?.as_i64()?;
    let id = value.get("id")?.as_str()?.to_string();
    Some((t, id))
}

impl PlanHistoryIndex {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = read_json_lenient(&path).unwrap_or_default();
        Self { path, document, last_discovery: None }
    }

    /// Refresh dirty sessions. `now` drives the 15s discovery throttle;
    /// `force` bypasses it. `parse_plans` is only invoked for sessions whose
    /// `(mtime, size, path)` changed or that are new, at most
    /// `parse_budget` (default 20) of them, most-recently-modified first.
    pub fn refresh<F>(
        &mut self,
        discovered: &[DiscoveredSession],
        now: DateTime<Utc>,
        force: bool,
        parse_plans: F,
    ) where
        F: Fn(&DiscoveredSession) -> Vec<PlanHistoryEntry>,
    {
        if !force {
            if let Some(last) = self.last_discovery {
                if now - last < chrono::Duration::seconds(15) {
                    return;
                }
            }
        }
        self.last_discovery = Some(now);

        let mut by_id: std::collections::HashMap<String, SessionPlanEntry> =
            std::mem::take(&mut self.document.sessions)
                .into_iter()
                .map(|s| (s.key.clone(), s))
                .collect();

        let mut dirty: Vec<&DiscoveredSession> = discovered
            .iter()
            .filter(|d| by_id.get(&d.session_id).map(|e| !e.matches(d)).unwrap_or(true))
            .collect();
        dirty.sort_by_key(|d| std::cmp::Reverse(d.modified_at));
        dirty.truncate(DEFAULT_PARSE_BUDGET.min(discovered.len().max(1)));

        for d in dirty {
            let plans = parse_plans(d);
            by_id.insert(
                d.session_id.clone(),
                SessionPlanEntry {
                    key: d.session_id.clone(),
                    session_id: d.session_id.clone(),
                    path: d.path.clone(),
                    project_path: d.project_path.clone(),
                    agent_family: d.agent_family.clone(),
                    mtime_ms: d.mtime_ms,
                    size_bytes: d.size_bytes,
                    created_at: d.created_at,
                    modified_at: d.modified_at,
                    plans,
                },
            );
        }

        let discovered_ids: std::collections::HashSet<&str> =
            discovered.iter().map(|d| d.session_id.as_str()).collect();
        by_id.retain(|id, _| discovered_ids.contains(id.as_str()));

        self.document.sessions = by_id.into_values().collect();
        self.document.version = DOCUMENT_VERSION;
        self.document.updated_at = Some(now);

        if let Err(err) = write_json_atomic(&self.path, &self.document) {
            tracing::warn!(error = %err, "failed to persist plan history index");
        }
    }

    pub fn list(&self, query: &ListQuery) -> ListResult {
        let mut all: Vec<&PlanHistoryEntry> = self
            .document
            .sessions
            .iter()
            .filter(|s| query.project_path.as_deref().is_none_or(|p| s.project_path == p))
            .filter(|s| query.session_id.as_deref().is_none_or(|id| s.session_id == id))
            .flat_map(|s| s.plans.iter())
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .filter(|p| query.from.is_none_or(|from| p.timestamp >= from))
            .filter(|p| query.to.is_none_or(|to| p.timestamp <= to))
            .collect();

        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));

        if let Some(cursor) = &query.cursor {
            if let Some((t_ms, id)) = decode_cursor(cursor) {
                all.retain(|p| {
                    let p_ms = p.timestamp.timestamp_millis();
                    (p_ms, p.id.as_str()) < (t_ms, id.as_str())
                });
            }
        }

        let limit = query.limit.clamp(1, 200);
        let has_more = all.len() > limit;
        let page: Vec<PlanHistoryEntry> = all.into_iter().take(limit).cloned().collect();
        let next_cursor = if has_more {
            page.last().map(|p| encode_cursor(p.timestamp.timestamp_millis(), &p.id))
        } else {
            None
        };

        ListResult { items: page, next_cursor, has_more }
    }

    /// All plans across the one or more rollout files that share `session_id`
    /// (ties broken by newest `mtime`).
    pub fn list_session(&self, session_id: &str) -> Option<SessionPlansView> {
        let entry = self
            .document
            .sessions
            .iter()
            .filter(|s| s.session_id == session_id)
            .max_by_key(|s| s.mtime_ms)?;
        Some(SessionPlansView {
            session_id: entry.session_id.clone(),
            project_path: entry.project_path.clone(),
            agent_family: entry.agent_family.clone(),
            plans: entry.plans.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obscope_types::TaskCounts;
    use tempfile::TempDir;

    fn plan(id: &str, ts: DateTime<Utc>) -> PlanHistoryEntry {
        PlanHistoryEntry {
            id: id.to_string(),
            session_id: "s1".to_string(),
            project_path: "/proj".to_string(),
            agent_family: "claude_code".to_string(),
            status: PlanStatus::Completed,
            timestamp: ts,
            title: "do the thing".to_string(),
            task_counts: TaskCounts::default(),
            duration_ms: None,
            markdown: String::new(),
            tasks: vec![],
        }
    }

    fn discovered(id: &str, mtime_ms: i64, now: DateTime<Utc>) -> DiscoveredSession {
        DiscoveredSession {
            session_id: id.to_string(),
            path: PathBuf::from(format!("/logs/{id}.jsonl")),
            project_path: "/proj".to_string(),
            agent_family: "claude_code".to_string(),
            mtime_ms,
            size_bytes: 100,
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn refresh_parses_new_session_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan-history.json");
        let mut index = PlanHistoryIndex::load(&path);
        let now = Utc::now();
        let d = discovered("s1", 1, now);
        index.refresh(&[d], now, true, |d| vec![plan("p1", now - chrono::Duration::minutes(1)).tap_session(&d.session_id)]);
        assert!(path.exists());
        let view = index.list_session("s1").unwrap();
        assert_eq!(view.plans.len(), 1);
    }

    #[test]
    fn unchanged_mtime_is_not_reparsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan-history.json");
        let mut index = PlanHistoryIndex::load(&path);
        let now = Utc::now();
        let d = discovered("s1", 1, now);
        let mut calls = 0;
        index.refresh(&[d.clone()], now, true, |_| {
            calls += 1;
            vec![]
        });
        index.refresh(&[d], now + chrono::Duration::seconds(20), true, |_| {
            calls += 1;
            vec![]
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn dropped_session_is_removed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan-history.json");
        let mut index = PlanHistoryIndex::load(&path);
        let now = Utc::now();
        index.refresh(&[discovered("s1", 1, now)], now, true, |_| vec![]);
        index.refresh(&[], now + chrono::Duration::seconds(20), true, |_| vec![]);
        assert!(index.list_session("s1").is_none());
    }

    #[test]
    fn list_paginates_newest_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan-history.json");
        let mut index = PlanHistoryIndex::load(&path);
        let now = Utc::now();
        index.refresh(&[discovered("s1", 1, now)], now, true, |_| {
            vec![plan("p1", now), plan("p2", now - chrono::Duration::minutes(1))]
        });

        let page1 = index.list(&ListQuery { limit: 1, ..Default::default() });
        assert_eq!(page1.items.len(), 1);
        assert_eq!(page1.items[0].id, "p1");
        assert!(page1.has_more);

        let page2 = index.list(&ListQuery { limit: 1, cursor: page1.next_cursor, ..Default::default() });
        assert_eq!(page2.items[0].id, "p2");
        assert!(!page2.has_more);
    }

    trait TapSession {
        fn tap_session(self, session_id: &str) -> Self;
    }
    impl TapSession for PlanHistoryEntry {
        fn tap_session(mut self, session_id: &str) -> Self {
            self.session_id = session_id.to_string();
            self
        }
    }
}
