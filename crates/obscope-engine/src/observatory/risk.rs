//! Risk Engine (spec §4.8): per-agent risk scoring from accumulator state
//! and the session's recent turn window.

use obscope_types::{
    FileHotspot, ModelCostBreakdown, ParsedSession, RiskAssessment, RiskLevel, SessionAccumulator,
    SpinningKind, SpinningSignal, TurnNode,
};
use std::collections::BTreeMap;

/// Tools whose repetition indicates retry-spin rather than steady progress
/// (Edit/Write and plan/meta tools are excluded — editing the same file
/// repeatedly is normal, revisiting a failing command is not).
const RETRY_SPIN_TOOLS: &[&str] = &["Bash", "Execute", "Read", "Grep", "Glob", "Search"];

fn model_price_per_million(model: &str) -> (f64, f64, f64, f64) {
    // (input, output, cache_read, cache_creation) $ per million tokens.
    if model.contains("opus") {
        (15.0, 75.0, 1.5, 18.75)
    } else if model.contains("sonnet") {
        (3.0, 15.0, 0.3, 3.75)
    } else if model.contains("haiku") {
        (0.8, 4.0, 0.08, 1.0)
    } else if model.contains("gpt-4") {
        (5.0, 15.0, 1.25, 5.0)
    } else {
        (3.0, 15.0, 0.3, 3.75)
    }
}

fn turn_cost(turn: &TurnNode) -> f64 {
    let model = turn.model.as_deref().unwrap_or("");
    let (input_price, output_price, _, _) = model_price_per_million(model);
    (turn.input_tokens as f64 * input_price + turn.output_tokens as f64 * output_price) / 1_000_000.0
}

fn file_hotspots(turns: &[TurnNode]) -> Vec<FileHotspot> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for turn in turns {
        for path in turn.changed_files() {
            *counts.entry(path.to_string()).or_insert(0) += 1;
        }
    }
    let mut hotspots: Vec<FileHotspot> = counts
        .into_iter()
        .filter(|(_, count)| *count >= 3)
        .map(|(path, edit_count)| FileHotspot { path, edit_count })
        .collect();
    hotspots.sort_by(|a, b| b.edit_count.cmp(&a.edit_count));
    hotspots.truncate(10);
    hotspots
}

fn compaction_proximity(turns: &[TurnNode]) -> RiskLevel {
    let window: Vec<&TurnNode> = turns.iter().rev().take(5).collect();
    if window.is_empty() {
        return RiskLevel::Nominal;
    }
    let avg_input = window.iter().map(|t| t.input_tokens).sum::<u64>() as f64 / window.len() as f64;
    if avg_input >= 150_000.0 {
        RiskLevel::Critical
    } else if avg_input >= 100_000.0 {
        RiskLevel::Elevated
    } else {
        RiskLevel::Nominal
    }
}

fn spinning_signals(turns: &[TurnNode]) -> Vec<SpinningSignal> {
    let window: Vec<&TurnNode> = turns.iter().rev().take(10).collect();
    let mut signals = Vec::new();

    let mut consecutive_errors = 0u32;
    let mut max_consecutive_errors = 0u32;
    for turn in window.iter().rev() {
        if turn.is_error {
            consecutive_errors += 1;
            max_consecutive_errors = max_consecutive_errors.max(consecutive_errors);
        } else {
            consecutive_errors = 0;
        }
    }
    if max_consecutive_errors >= 5 {
        signals.push(SpinningSignal {
            kind: SpinningKind::ErrorLoop,
            level: RiskLevel::Critical,
            detail: format!("{max_consecutive_errors} consecutive error turns"),
        });
    } else if max_consecutive_errors >= 3 {
        signals.push(SpinningSignal {
            kind: SpinningKind::ErrorLoop,
            level: RiskLevel::Elevated,
            detail: format!("{max_consecutive_errors} consecutive error turns"),
        });
    }

    let mut file_edits: BTreeMap<String, u32> = BTreeMap::new();
    for turn in &window {
        for path in turn.changed_files() {
            *file_edits.entry(path.to_string()).or_insert(0) += 1;
        }
    }
    if let Some((path, count)) = file_edits.into_iter().max_by_key(|(_, c)| *c) {
        if count >= 8 {
            signals.push(SpinningSignal {
                kind: SpinningKind::FileChurn,
                level: RiskLevel::Critical,
                detail: format!("{path} edited {count} times in last 10 turns"),
            });
        } else if count >= 5 {
            signals.push(SpinningSignal {
                kind: SpinningKind::FileChurn,
                level: RiskLevel::Elevated,
                detail: format!("{path} edited {count} times in last 10 turns"),
            });
        }
    }

    let last5: Vec<&TurnNode> = turns.iter().rev().take(5).collect();
    let mut repeat_counts: BTreeMap<(String, String), u32> = BTreeMap::new();
    for turn in &last5 {
        for research in &turn.research {
            if RETRY_SPIN_TOOLS.contains(&research.tool.as_str()) {
                *repeat_counts.entry((research.tool.clone(), research.target.clone())).or_insert(0) += 1;
            }
        }
        for cmd in &turn.actions.commands {
            if RETRY_SPIN_TOOLS.contains(&"Bash") {
                *repeat_counts.entry(("Bash".to_string(), cmd.command.clone())).or_insert(0) += 1;
            }
        }
    }
    if let Some((_, count)) = repeat_counts.into_iter().max_by_key(|(_, c)| *c) {
        if count >= 4 {
            signals.push(SpinningSignal {
                kind: SpinningKind::RepeatedTool,
                level: RiskLevel::Elevated,
                detail: "same tool target repeated across recent turns".to_string(),
            });
        }
    }

    let error_count_in_window = window.iter().filter(|t| t.is_error).count();
    let commits_in_window = window.iter().filter(|t| t.commit).count();
    if error_count_in_window >= 5 && commits_in_window == 0 {
        signals.push(SpinningSignal {
            kind: SpinningKind::Stuck,
            level: RiskLevel::Critical,
            detail: format!("{error_count_in_window} errors, no commits in last 10 turns"),
        });
    }

    signals
}

/// Compute the full risk assessment for one session, using the accumulator
/// for error/correction rates (compaction-safe) and the current parse's
/// turn window for spinning signals and hotspots.
pub fn assess_risk(session: &ParsedSession, accumulator: &SessionAccumulator) -> RiskAssessment {
    let error_rate = if accumulator.total_turns > 0 {
        accumulator.error_turns as f64 / accumulator.total_turns as f64
    } else {
        0.0
    };
    let correction_ratio = if accumulator.error_turns > 0 {
        accumulator.correction_turns as f64 / accumulator.error_turns as f64
    } else {
        1.0
    };

    let compaction = compaction_proximity(&session.turns);
    let signals = spinning_signals(&session.turns);
    let hotspots = file_hotspots(&session.turns);

    let has_critical_signal = signals.iter().any(|s| s.level == RiskLevel::Critical);
    let has_elevated_signal = signals.iter().any(|s| s.level == RiskLevel::Elevated);

    let overall = if has_critical_signal
        || (accumulator.total_turns >= 6 && error_rate > 0.35 && correction_ratio < 0.40)
        || compaction == RiskLevel::Critical
    {
        RiskLevel::Critical
    } else if has_elevated_signal
        || error_rate > 0.20
        || (correction_ratio < 0.40 && error_rate > 0.10)
        || compaction == RiskLevel::Elevated
    {
        RiskLevel::Elevated
    } else {
        RiskLevel::Nominal
    };

    let mut model_breakdown: BTreeMap<String, ModelCostBreakdown> = BTreeMap::new();
    let mut total_cost = 0.0;
    for turn in &session.turns {
        let Some(model) = turn.model.clone() else { continue };
        let cost = turn_cost(turn);
        total_cost += cost;
        let entry = model_breakdown.entry(model.clone()).or_insert_with(|| ModelCostBreakdown {
            model,
            ..Default::default()
        });
        entry.cost += cost;
        entry.tokens += turn.input_tokens + turn.output_tokens;
        entry.turns += 1;
    }
    let cost = total_cost.max(accumulator.cost);

    RiskAssessment {
        overall,
        error_rate,
        correction_ratio,
        compaction_proximity: compaction,
        signals,
        hotspots,
        cost,
        model_breakdown: model_breakdown.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_turns_is_nominal() {
        let accumulator = SessionAccumulator::default();
        let session = ParsedSession {
            id: "s".to_string(),
            project_path: "/p".to_string(),
            agent_family: "claude_code".to_string(),
            rollout_path: "/p/s.jsonl".into(),
            created_at: chrono::Utc::now(),
            modified_at: chrono::Utc::now(),
            size_bytes: 0,
            turns: vec![],
        };
        let risk = assess_risk(&session, &accumulator);
        assert_eq!(risk.overall, RiskLevel::Nominal);
        assert_eq!(risk.correction_ratio, 1.0);
    }
}
