//! Turn Builder: classifies an `AgentTurn` (the raw, per-provider assembled
//! turn in `obscope_types`) into a `TurnNode` (spec §4.3) — category,
//! summary, research/actions/corrections/artifacts/escalations, plan and
//! task markers.

use obscope_types::{
    Artifact, CommandAction, Correction, Escalation, FileAction, ParsedSession, PlanMarker,
    PlanMarkerKind, ResearchAction, TaskMutation, TaskMutationKind, TurnActions, TurnCategory,
    TurnNode,
};
use obscope_types::{AgentSession, AgentTurn, ToolCallPayload, ToolExecution};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(what|why|how|when|where|who|is|are|can|could|should|would|do|does)\b.*\?\s*$").unwrap()
});
static FEEDBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(no[,.]|not quite|that'?s wrong|undo that|revert|actually|instead|don'?t\b)").unwrap()
});
static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*/\S+").unwrap());
static CONTINUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(continue|keep going|go on|proceed|resume|next)\b").unwrap()
});
static INTERRUPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(stop|wait|hold on|cancel|pause)\b").unwrap());
static SYSTEM_WRAPPER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*<(system-reminder|task-notification)>").unwrap());
static DECISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(I'?ll|I will|let'?s|plan to|going to|I'?m going to)\b").unwrap()
});

/// Classify the cleaned user instruction per spec §4.3's priority-ordered
/// regex tables. `has_slash_command` short-circuits straight to `Command`.
pub fn classify_category(text: &str, has_slash_command: bool) -> TurnCategory {
    let trimmed = text.trim();
    if has_slash_command || COMMAND_RE.is_match(trimmed) {
        return TurnCategory::Command;
    }
    if SYSTEM_WRAPPER_RE.is_match(trimmed) {
        return TurnCategory::System;
    }
    if trimmed.is_empty() {
        return TurnCategory::Context;
    }
    if INTERRUPTION_RE.is_match(trimmed) {
        return TurnCategory::Interruption;
    }
    if CONTINUATION_RE.is_match(trimmed) {
        return TurnCategory::Continuation;
    }
    if FEEDBACK_RE.is_match(trimmed) {
        return TurnCategory::Feedback;
    }
    if QUESTION_RE.is_match(trimmed) || trimmed.ends_with('?') {
        return TurnCategory::Question;
    }
    if trimmed.split_whitespace().count() <= 3 {
        return TurnCategory::Conversation;
    }
    TurnCategory::Task
}

fn all_tool_executions(turn: &AgentTurn) -> Vec<&ToolExecution> {
    turn.steps.iter().flat_map(|s| s.tools.iter()).collect()
}

fn file_target(call: &ToolCallPayload) -> Option<String> {
    match call {
        ToolCallPayload::FileRead { arguments, .. } => arguments.path().map(str::to_string),
        ToolCallPayload::FileEdit { arguments, .. } => Some(arguments.file_path.clone()),
        ToolCallPayload::FileWrite { arguments, .. } => Some(arguments.file_path.clone()),
        ToolCallPayload::Search { arguments, .. } => arguments.path.clone(),
        _ => None,
    }
}

/// Parse `git commit` subjects, including the heredoc form
/// (`git commit -m "$(cat <<'EOF' ... EOF)"`) the teacher's family of agents
/// commonly emits.
fn commit_subject(command: &str) -> Option<String> {
    if !command.contains("git commit") {
        return None;
    }
    let start = command.find("-m ")?;
    let rest = command[start + 3..].trim_start();
    let rest = rest.strip_prefix("\"$(cat <<'EOF'").unwrap_or(rest);
    let body = rest.strip_prefix(['"', '\'']).unwrap_or(rest);
    let subject = body.lines().next().unwrap_or(body).trim();
    let subject = subject.trim_end_matches(['"', '\'']);
    if subject.is_empty() { None } else { Some(subject.to_string()) }
}

/// Build a `TurnNode` from a raw `AgentTurn`. `index` is the position within
/// the current parse (resets across compaction, per spec §3).
pub fn build_turn_node(turn: &AgentTurn, index: usize) -> TurnNode {
    let full_instruction = turn.user.content.text.clone();
    let category = classify_category(&full_instruction, turn.user.slash_command.is_some());
    let summary = obscope_types::summarize_instruction(&full_instruction);

    let approach_thinking: Vec<String> = turn
        .steps
        .iter()
        .filter_map(|step| step.reasoning.as_ref())
        .map(|r| r.content.text.clone())
        .collect();

    let decisions: Vec<String> = approach_thinking
        .iter()
        .filter(|t| DECISION_RE.is_match(t))
        .cloned()
        .collect();

    let mut research = Vec::new();
    let mut actions = TurnActions::default();
    let mut artifacts = Vec::new();
    let mut escalations = Vec::new();
    let mut plan_markers = Vec::new();
    let mut task_mutations = Vec::new();
    let mut tool_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut commit = false;
    let mut commit_subject_text = None;
    let mut input_tokens = 0u64;
    let mut output_tokens = 0u64;

    for step in &turn.steps {
        if let Some(usage) = &step.usage {
            input_tokens += usage.input_tokens().max(0) as u64;
            output_tokens += usage.output_tokens().max(0) as u64;
        }
    }

    let executions = all_tool_executions(turn);
    for (i, exec) in executions.iter().enumerate() {
        let name = exec.call.content.name().to_string();
        *tool_counts.entry(name.clone()).or_insert(0) += 1;

        match &exec.call.content {
            ToolCallPayload::FileRead { .. } | ToolCallPayload::Search { .. } => {
                if let Some(target) = file_target(&exec.call.content) {
                    research.push(ResearchAction { tool: name.clone(), target });
                }
            }
            ToolCallPayload::FileWrite { arguments, .. } => {
                actions.creates.push(FileAction { path: arguments.file_path.clone() });
            }
            ToolCallPayload::FileEdit { arguments, .. } => {
                actions.edits.push(FileAction { path: arguments.file_path.clone() });
            }
            ToolCallPayload::Execute { arguments, .. } => {
                if let Some(cmd) = arguments.command() {
                    actions.commands.push(CommandAction { command: cmd.to_string() });
                    if let Some(subject) = commit_subject(cmd) {
                        commit = true;
                        commit_subject_text = Some(subject.clone());
                        artifacts.push(Artifact {
                            changed_files: actions
                                .edits
                                .iter()
                                .chain(actions.creates.iter())
                                .map(|a| a.path.clone())
                                .collect(),
                            commit_subject: Some(subject),
                        });
                    }
                }
            }
            _ => {}
        }

        if name == "AskUserQuestion" {
            if let Some(result) = &exec.result {
                escalations.push(Escalation { question: result.content.output.clone() });
            }
        }

        if name == "EnterPlanMode" {
            plan_markers.push(PlanMarker { kind: PlanMarkerKind::Entered, markdown: None });
        }
        if name == "ExitPlanMode" {
            let rejected = executions
                .get(i + 1)
                .and_then(|next| next.result.as_ref())
                .map(|r| r.content.output.to_lowercase().contains("tool use was rejected"))
                .unwrap_or(false);
            let markdown = plan_markdown_from_call(&exec.call.content);
            plan_markers.push(PlanMarker {
                kind: if rejected { PlanMarkerKind::Rejected } else { PlanMarkerKind::Exited },
                markdown,
            });
        }

        if name == "TaskCreate" {
            let task_id = executions
                .get(i + 1)
                .and_then(|next| next.result.as_ref())
                .and_then(|r| extract_created_task_id(&r.content.output));
            task_mutations.push(TaskMutation { kind: TaskMutationKind::Created, task_id, status: None });
        }
        if name == "TaskUpdate" {
            task_mutations.push(TaskMutation { kind: TaskMutationKind::Updated, task_id: None, status: None });
        }
    }

    let corrections = build_corrections(&executions);

    TurnNode {
        index,
        timestamp: turn.timestamp,
        category,
        summary,
        full_instruction,
        approach_thinking,
        decisions,
        research,
        actions,
        corrections,
        artifacts,
        escalations,
        tool_counts,
        commit,
        commit_subject: commit_subject_text,
        compaction: false,
        plan_markers,
        task_mutations,
        input_tokens,
        output_tokens,
        model: None,
        duration_ms: if turn.stats.duration_ms > 0 { Some(turn.stats.duration_ms) } else { None },
        start_line: 0,
        end_line: 0,
        is_error: executions.iter().any(|e| e.is_error),
    }
}

/// Build a `ParsedSession` (spec §3's `Session` entity) from one assembled
/// main-stream `AgentSession` plus the rollout file metadata Discovery
/// already has on hand. This is the seam between the Turn Builder and the
/// Parse Cache: every turn in `assembled` becomes one `TurnNode`.
#[allow(clippy::too_many_arguments)]
pub fn build_parsed_session(
    session_id: String,
    project_path: String,
    agent_family: String,
    rollout_path: PathBuf,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    size_bytes: u64,
    assembled: &AgentSession,
) -> ParsedSession {
    let turns = assembled
        .turns
        .iter()
        .enumerate()
        .map(|(index, turn)| build_turn_node(turn, index))
        .collect();

    ParsedSession {
        id: session_id,
        project_path,
        agent_family,
        rollout_path,
        created_at,
        modified_at,
        size_bytes,
        turns,
    }
}

fn plan_markdown_from_call(call: &ToolCallPayload) -> Option<String> {
    if let ToolCallPayload::Generic { arguments, .. } = call {
        arguments.get("plan").and_then(|v| v.as_str()).map(str::to_string)
    } else {
        None
    }
}

fn extract_created_task_id(output: &str) -> Option<String> {
    static TASK_ID_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"Task #(\w+) created successfully").unwrap());
    TASK_ID_RE.captures(output).map(|c| c[1].to_string())
}

/// Pair each error tool-result with whatever fixed it within the following
/// 5 tool calls (a successful Edit/Write), else "unresolved".
fn build_corrections(executions: &[&ToolExecution]) -> Vec<Correction> {
    let mut corrections = Vec::new();
    for (i, exec) in executions.iter().enumerate() {
        if !exec.is_error {
            continue;
        }
        let Some(result) = &exec.result else { continue };
        let fix = executions
            .iter()
            .skip(i + 1)
            .take(5)
            .find_map(|next| {
                if next.is_error {
                    return None;
                }
                match &next.call.content {
                    ToolCallPayload::FileEdit { arguments, .. } => {
                        Some(format!("Fixed in {}", arguments.file_path))
                    }
                    ToolCallPayload::FileWrite { arguments, .. } => {
                        Some(format!("Fixed in {}", arguments.file_path))
                    }
                    _ => None,
                }
            })
            .unwrap_or_else(|| "unresolved".to_string());
        corrections.push(Correction { error: result.content.output.clone(), fix });
    }
    corrections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_slash_command() {
        assert_eq!(classify_category("/commit now", false), TurnCategory::Command);
    }

    #[test]
    fn classify_question() {
        assert_eq!(classify_category("Why is this failing?", false), TurnCategory::Question);
    }

    #[test]
    fn classify_feedback() {
        assert_eq!(
            classify_category("No, that's wrong, use the other function", false),
            TurnCategory::Feedback
        );
    }

    #[test]
    fn commit_subject_simple() {
        assert_eq!(
            commit_subject(r#"git commit -m "fix auth bug""#),
            Some("fix auth bug".to_string())
        );
    }

    #[test]
    fn commit_subject_none_without_git_commit() {
        assert_eq!(commit_subject("git status"), None);
    }

    #[test]
    fn build_parsed_session_assigns_sequential_indices() {
        use obscope_types::{UserMessage, UserPayload};
        use uuid::Uuid;

        let assembled = AgentSession {
            session_id: Uuid::new_v4(),
            stream_id: obscope_types::StreamId::Main,
            spawned_by: None,
            start_time: Utc::now(),
            end_time: None,
            turns: (0..3)
                .map(|_| AgentTurn {
                    id: Uuid::new_v4(),
                    timestamp: Utc::now(),
                    user: UserMessage {
                        event_id: Uuid::new_v4(),
                        content: UserPayload { text: "do the thing".to_string() },
                        slash_command: None,
                    },
                    steps: vec![],
                    stats: Default::default(),
                })
                .collect(),
            stats: Default::default(),
        };

        let parsed = build_parsed_session(
            "s1".to_string(),
            "/proj".to_string(),
            "claude_code".to_string(),
            PathBuf::from("/proj/s1.jsonl"),
            Utc::now(),
            Utc::now(),
            123,
            &assembled,
        );

        assert_eq!(parsed.turns.len(), 3);
        assert_eq!(parsed.turns.iter().map(|t| t.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
