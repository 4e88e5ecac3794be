//! `TurnNode`: the per-turn classification the dashboard and risk engine
//! consume, derived from an `AgentTurn` by the Turn Builder. Plain data only
//! — derivation lives in `obscope_engine`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnCategory {
    Task,
    Question,
    Feedback,
    Command,
    Continuation,
    Interruption,
    Context,
    System,
    Conversation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchAction {
    pub tool: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAction {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandAction {
    pub command: String,
}

/// Every tool action the turn performed, split by intent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnActions {
    pub creates: Vec<FileAction>,
    pub edits: Vec<FileAction>,
    pub commands: Vec<CommandAction>,
}

/// An error tool-result paired with whatever fixed it, if anything did
/// within the following 5 tool calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub error: String,
    pub fix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub changed_files: Vec<String>,
    pub commit_subject: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
    pub question: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMarkerKind {
    Entered,
    Exited,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanMarker {
    pub kind: PlanMarkerKind,
    pub markdown: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMutationKind {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMutation {
    pub kind: TaskMutationKind,
    pub task_id: Option<String>,
    pub status: Option<String>,
}

/// One user instruction plus every subsequent assistant/tool event up to the
/// next real user instruction, classified for the dashboard. Index is
/// monotonic within one parse of a session; it resets across a compaction —
/// global continuity is the accumulator's job, not the turn's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnNode {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub category: TurnCategory,
    /// First sentence of the instruction, truncated to 80 chars at a word boundary.
    pub summary: String,
    pub full_instruction: String,
    pub approach_thinking: Vec<String>,
    pub decisions: Vec<String>,
    pub research: Vec<ResearchAction>,
    pub actions: TurnActions,
    pub corrections: Vec<Correction>,
    pub artifacts: Vec<Artifact>,
    pub escalations: Vec<Escalation>,
    pub tool_counts: std::collections::BTreeMap<String, u64>,
    pub commit: bool,
    pub commit_subject: Option<String>,
    pub compaction: bool,
    pub plan_markers: Vec<PlanMarker>,
    pub task_mutations: Vec<TaskMutation>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: Option<String>,
    pub duration_ms: Option<i64>,
    pub start_line: usize,
    pub end_line: usize,
    pub is_error: bool,
}

impl TurnNode {
    pub fn has_error(&self) -> bool {
        self.is_error
    }

    pub fn changed_files(&self) -> impl Iterator<Item = &str> {
        self.actions
            .creates
            .iter()
            .chain(self.actions.edits.iter())
            .map(|a| a.path.as_str())
    }
}

/// Truncate an instruction to an 80-char summary at a word boundary with an
/// ellipsis, per the Turn Builder contract (spec §4.3).
pub fn summarize_instruction(text: &str) -> String {
    const MAX: usize = 80;
    let first_sentence = text
        .split(['\n'])
        .next()
        .unwrap_or(text)
        .split_inclusive(['.', '?', '!'])
        .next()
        .unwrap_or(text)
        .trim();

    if first_sentence.chars().count() <= MAX {
        return first_sentence.to_string();
    }

    let mut truncated = String::new();
    for word in first_sentence.split_whitespace() {
        let candidate_len = truncated.chars().count() + word.chars().count() + 1;
        if candidate_len > MAX - 1 {
            break;
        }
        if !truncated.is_empty() {
            truncated.push(' ');
        }
        truncated.push_str(word);
    }
    truncated.push('…');
    truncated
}

/// The spec's `Session` entity: one parsed rollout file, assigned turns and
/// file metadata. Distinct from `obscope_types::AgentSession`, which is the
/// raw event-assembled transcript the Turn Builder consumes as input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedSession {
    pub id: String,
    pub project_path: String,
    pub agent_family: String,
    pub rollout_path: std::path::PathBuf,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub turns: Vec<TurnNode>,
}
