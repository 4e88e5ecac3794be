//! Feed Log (spec §4.7): append-only, de-duplicated activity feed capped at
//! 200 entries, fed by turn classifications and collision deltas.

use obscope_types::{Collision, FeedEvent, FeedEventKind, TurnNode};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

const FEED_CAP: usize = 200;

/// Derive a stable id for a turn-originated feed event so re-deriving the
/// same turn (e.g. after a cache refresh) doesn't duplicate the entry.
fn stable_id(session_id: &str, discriminant: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(b"|");
    hasher.update(discriminant.as_bytes());
    hasher.update(b"|");
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

fn turn_event(session_id: &str, turn: &TurnNode) -> Option<FeedEvent> {
    let (kind, discriminant) = if turn.is_error {
        (FeedEventKind::Error, "error")
    } else if turn.compaction {
        (FeedEventKind::Compaction, "compaction")
    } else if turn.plan_markers.iter().any(|m| m.kind == obscope_types::PlanMarkerKind::Entered) {
        (FeedEventKind::PlanStarted, "plan_started")
    } else if let Some(title) = turn
        .plan_markers
        .iter()
        .find(|m| m.kind == obscope_types::PlanMarkerKind::Exited)
        .and_then(|m| m.markdown.clone())
    {
        (FeedEventKind::PlanApproved { title }, "plan_approved")
    } else if turn
        .task_mutations
        .iter()
        .any(|m| m.kind == obscope_types::TaskMutationKind::Updated && m.status.as_deref() == Some("completed"))
    {
        (FeedEventKind::TaskCompleted, "task_completed")
    } else if turn.commit {
        (FeedEventKind::Completion, "commit")
    } else {
        return None;
    };

    Some(FeedEvent {
        id: stable_id(session_id, discriminant, &turn.index.to_string()),
        session_id: session_id.to_string(),
        kind,
        timestamp: turn.timestamp,
        summary: turn.summary.clone(),
    })
}

fn collision_events(collisions: &[Collision], now: DateTime<Utc>) -> Vec<FeedEvent> {
    collisions
        .iter()
        .map(|c| FeedEvent {
            id: stable_id(&c.session_ids.join(","), "collision", &c.path),
            session_id: c.session_ids.first().cloned().unwrap_or_default(),
            kind: FeedEventKind::Collision,
            timestamp: now,
            summary: format!("{} sessions touching {}", c.session_ids.len(), c.path),
        })
        .collect()
}

/// Append-only, capped, de-duplicated activity log. Insertion order is
/// preserved; the oldest entries are evicted once the cap is exceeded.
#[derive(Default)]
pub struct FeedLog {
    seen: BTreeSet<String>,
    order: VecDeque<String>,
    events: BTreeMap<String, FeedEvent>,
}

impl FeedLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, event: FeedEvent) {
        if self.seen.contains(&event.id) {
            return;
        }
        self.seen.insert(event.id.clone());
        self.order.push_back(event.id.clone());
        self.events.insert(event.id.clone(), event);

        while self.order.len() > FEED_CAP {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
                self.events.remove(&oldest);
            }
        }
    }

    /// Ingest a session's turns and this tick's detected collisions,
    /// appending any newly-derivable events.
    pub fn ingest(&mut self, session_id: &str, turns: &[TurnNode], collisions: &[Collision], now: DateTime<Utc>) {
        for turn in turns {
            if let Some(event) = turn_event(session_id, turn) {
                self.push(event);
            }
        }
        for event in collision_events(collisions, now) {
            self.push(event);
        }
    }

    /// Mark a session that has stopped emitting events as ended.
    pub fn session_ended(&mut self, session_id: &str, now: DateTime<Utc>) {
        self.push(FeedEvent {
            id: stable_id(session_id, "session_ended", ""),
            session_id: session_id.to_string(),
            kind: FeedEventKind::SessionEnded,
            timestamp: now,
            summary: "session ended".to_string(),
        });
    }

    /// Record a transient stall/idle state. Unlike other events these are
    /// allowed to re-fire (id includes the tick bucket) since the condition
    /// can recur after resolving.
    pub fn transient(&mut self, session_id: &str, idle: bool, bucket: i64, now: DateTime<Utc>) {
        let kind = if idle { FeedEventKind::Idle } else { FeedEventKind::Stall };
        let discriminant = if idle { "idle" } else { "stall" };
        self.push(FeedEvent {
            id: stable_id(session_id, discriminant, &bucket.to_string()),
            session_id: session_id.to_string(),
            kind,
            timestamp: now,
            summary: if idle { "idle".to_string() } else { "stalled".to_string() },
        });
    }

    /// Entries newest-first, per the dashboard's feed ordering.
    pub fn entries(&self) -> Vec<FeedEvent> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.events.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
