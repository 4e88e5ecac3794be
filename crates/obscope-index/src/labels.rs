//! Session label store (spec §3/§4.1): short, stable, human-memorable names
//! assigned to sessions from a fixed pool, persisted so they survive daemon
//! restarts, reclaimed after the session goes quiet.

use crate::atomic::{read_json_lenient, write_json_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Reclaimed after this long without being touched by `touch`/`assign`.
const RECLAIM_AFTER_HOURS: i64 = 2;

const NAME_POOL: &[&str] = &[
    "aspen", "birch", "cedar", "dune", "elm", "fern", "gale", "heath", "iris", "juniper", "kelp",
    "larch", "maple", "nettle", "oak", "pine", "quill", "reed", "sage", "thistle", "umber",
    "vale", "willow", "yarrow", "zephyr",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LabelEntry {
    name: String,
    last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LabelDocument {
    #[serde(default)]
    sessions: BTreeMap<String, LabelEntry>,
}

pub struct LabelStore {
    path: PathBuf,
    document: LabelDocument,
}

impl LabelStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = read_json_lenient(&path).unwrap_or_default();
        Self { path, document }
    }

    /// Look up or assign a label for `session_id`. Hashes the id into the
    /// pool, linear-probing on collision with an already-live label.
    pub fn assign(&mut self, session_id: &str, now: DateTime<Utc>) -> String {
        if let Some(entry) = self.document.sessions.get_mut(session_id) {
            entry.last_seen = now;
            return entry.name.clone();
        }

        let live_names: std::collections::BTreeSet<&str> =
            self.document.sessions.values().map(|e| e.name.as_str()).collect();

        let start = pool_hash(session_id) % NAME_POOL.len();
        let name = (0..NAME_POOL.len())
            .map(|offset| NAME_POOL[(start + offset) % NAME_POOL.len()])
            .find(|candidate| !live_names.contains(candidate))
            .unwrap_or(NAME_POOL[start])
            .to_string();

        self.document
            .sessions
            .insert(session_id.to_string(), LabelEntry { name: name.clone(), last_seen: now });
        name
    }

    /// Drop labels not touched within `RECLAIM_AFTER_HOURS`.
    pub fn reclaim(&mut self, now: DateTime<Utc>) {
        let cutoff = now - chrono::Duration::hours(RECLAIM_AFTER_HOURS);
        self.document.sessions.retain(|_, entry| entry.last_seen >= cutoff);
    }

    pub fn persist(&self) {
        if let Err(err) = write_json_atomic(&self.path, &self.document) {
            tracing::warn!(error = %err, "failed to persist label store");
        }
    }
}

fn pool_hash(session_id: &str) -> usize {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    session_id.hash(&mut hasher);
    hasher.finish() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn same_session_gets_same_label_across_calls() {
        let dir = TempDir::new().unwrap();
        let mut store = LabelStore::load(dir.path().join("labels.json"));
        let now = Utc::now();
        let a = store.assign("s1", now);
        let b = store.assign("s1", now);
        assert_eq!(a, b);
    }

    #[test]
    fn labels_are_unique_among_live_sessions() {
        let dir = TempDir::new().unwrap();
        let mut store = LabelStore::load(dir.path().join("labels.json"));
        let now = Utc::now();
        let mut seen = std::collections::BTreeSet::new();
        for i in 0..NAME_POOL.len() {
            let label = store.assign(&format!("session-{i}"), now);
            assert!(seen.insert(label), "label collided among live sessions");
        }
    }

    #[test]
    fn reclaim_drops_stale_labels() {
        let dir = TempDir::new().unwrap();
        let mut store = LabelStore::load(dir.path().join("labels.json"));
        let now = Utc::now();
        store.assign("s1", now - chrono::Duration::hours(3));
        store.reclaim(now);
        assert!(store.document.sessions.is_empty());
    }

    #[test]
    fn labels_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.json");
        let now = Utc::now();
        {
            let mut store = LabelStore::load(&path);
            store.assign("s1", now);
            store.persist();
        }
        let mut reloaded = LabelStore::load(&path);
        let label = reloaded.assign("s1", now);
        assert!(NAME_POOL.contains(&label.as_str()));
    }
}
