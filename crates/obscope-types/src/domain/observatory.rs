//! Cross-session aggregate types: the shapes the dashboard builder produces
//! and the fan-out layer pushes to subscribers and uplinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Stable id for an operator. The local user is always `self`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(pub String);

impl OperatorId {
    pub fn this_machine() -> Self {
        Self("self".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub display_name: String,
    pub color: String,
    pub online: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Busy,
    Warning,
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Nominal,
    Elevated,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinningKind {
    ErrorLoop,
    FileChurn,
    RepeatedTool,
    Stuck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinningSignal {
    pub kind: SpinningKind,
    pub level: RiskLevel,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHotspot {
    pub path: String,
    pub edit_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCostBreakdown {
    pub model: String,
    pub cost: f64,
    pub tokens: u64,
    pub turns: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall: RiskLevel,
    pub error_rate: f64,
    pub correction_ratio: f64,
    pub compaction_proximity: RiskLevel,
    pub signals: Vec<SpinningSignal>,
    pub hotspots: Vec<FileHotspot>,
    pub cost: f64,
    pub model_breakdown: Vec<ModelCostBreakdown>,
}

impl RiskAssessment {
    pub fn nominal() -> Self {
        Self {
            overall: RiskLevel::Nominal,
            error_rate: 0.0,
            correction_ratio: 1.0,
            compaction_proximity: RiskLevel::Nominal,
            signals: Vec::new(),
            hotspots: Vec::new(),
            cost: 0.0,
            model_breakdown: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Drafting,
    Implementing,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: u32,
    pub completed: u32,
    pub in_progress: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub id: String,
    pub title: String,
    pub status: PlanStatus,
    pub task_counts: TaskCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub session_id: String,
    pub label: String,
    pub operator_id: OperatorId,
    pub project_path: PathBuf,
    pub status: AgentStatus,
    pub current_task: Option<String>,
    pub active: bool,
    pub plan_list: Vec<PlanSummary>,
    pub risk: RiskAssessment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workstream {
    pub project_path: PathBuf,
    pub agent_session_ids: Vec<String>,
    pub completion_pct: f64,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collision {
    pub path: String,
    pub session_ids: Vec<String>,
    pub operator_ids: Vec<OperatorId>,
    pub project_path: PathBuf,
    pub severity: CollisionSeverity,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEventKind {
    Start,
    Completion,
    Error,
    Compaction,
    PlanStarted,
    PlanApproved { title: String },
    TaskCompleted,
    SessionEnded,
    Collision,
    CollisionResolved,
    Stall,
    Idle,
}

/// One append-only feed entry. `id` is stable across ticks so the feed log
/// can dedupe re-derived turn events (see `obscope_runtime`'s feed module).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEvent {
    pub id: String,
    pub session_id: String,
    pub kind: FeedEventKind,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
}

/// Per-session carry-forward that survives compaction. Every counter here is
/// a monotonic max, never reset by a smaller re-parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionAccumulator {
    pub total_turns: u64,
    pub tool_calls: u64,
    pub commits: u64,
    pub compactions: u64,
    pub error_turns: u64,
    pub correction_turns: u64,
    pub tokens: u64,
    pub cost: f64,
    pub changed_files: BTreeSet<String>,
    pub tool_counts: BTreeMap<String, u64>,
    pub plan_cycles: Vec<PlanSummary>,
    pub error_trend: Vec<bool>,
}

impl SessionAccumulator {
    /// Fold a freshly-parsed delta into the accumulator, per §4.4: every
    /// monotonic counter takes the higher of the two; files/tool counts
    /// union/max; plan cycles keep the more advanced set; cost is the max.
    pub fn absorb(&mut self, current: &SessionAccumulator) {
        self.total_turns = self.total_turns.max(current.total_turns);
        self.tool_calls = self.tool_calls.max(current.tool_calls);
        self.commits = self.commits.max(current.commits);
        self.compactions = self.compactions.max(current.compactions);
        self.error_turns = self.error_turns.max(current.error_turns);
        self.correction_turns = self.correction_turns.max(current.correction_turns);
        self.tokens = self.tokens.max(current.tokens);
        self.cost = self.cost.max(current.cost);
        self.changed_files.extend(current.changed_files.iter().cloned());

        for (tool, count) in &current.tool_counts {
            let entry = self.tool_counts.entry(tool.clone()).or_insert(0);
            *entry = (*entry).max(*count);
        }

        if !current.plan_cycles.is_empty() {
            self.plan_cycles = current.plan_cycles.clone();
        }

        if current.error_trend.len() > self.error_trend.len() {
            self.error_trend = current.error_trend.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub active_count: u32,
    pub collision_count: u32,
    pub aggregate_cost: f64,
    pub workstreams_at_risk: u32,
}

/// One immutable value produced per tick and pushed to subscribers/uplinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub operators: Vec<Operator>,
    pub agents: Vec<Agent>,
    pub workstreams: Vec<Workstream>,
    pub collisions: Vec<Collision>,
    pub feed: Vec<FeedEvent>,
    pub summary: SnapshotSummary,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            operators: Vec::new(),
            agents: Vec::new(),
            workstreams: Vec::new(),
            collisions: Vec::new(),
            feed: Vec::new(),
            summary: SnapshotSummary::default(),
        }
    }
}

/// One finalized plan cycle, persisted across daemon restarts by the plan
/// history index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanHistoryEntry {
    pub id: String,
    pub session_id: String,
    pub project_path: String,
    pub agent_family: String,
    pub status: PlanStatus,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub task_counts: TaskCounts,
    pub duration_ms: Option<i64>,
    pub markdown: String,
    pub tasks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_absorb_is_monotonic() {
        let mut acc = SessionAccumulator {
            total_turns: 50,
            commits: 3,
            ..Default::default()
        };
        acc.changed_files.insert("a.rs".to_string());

        let mut current = SessionAccumulator {
            total_turns: 4,
            commits: 5,
            ..Default::default()
        };
        current.changed_files.insert("b.rs".to_string());

        acc.absorb(&current);

        assert_eq!(acc.total_turns, 50, "compaction must not lower the baseline");
        assert_eq!(acc.commits, 5, "a higher current value wins");
        assert!(acc.changed_files.contains("a.rs"));
        assert!(acc.changed_files.contains("b.rs"));
    }

    #[test]
    fn accumulator_tool_counts_take_max_per_tool() {
        let mut acc = SessionAccumulator::default();
        acc.tool_counts.insert("Edit".to_string(), 10);

        let mut current = SessionAccumulator::default();
        current.tool_counts.insert("Edit".to_string(), 3);
        current.tool_counts.insert("Bash".to_string(), 7);

        acc.absorb(&current);

        assert_eq!(acc.tool_counts["Edit"], 10);
        assert_eq!(acc.tool_counts["Bash"], 7);
    }
}
