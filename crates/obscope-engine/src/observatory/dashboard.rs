//! Dashboard Builder (spec §4.5): the per-tick assembly step that turns
//! parsed sessions, risk assessments, collisions, and the feed log into one
//! immutable `Snapshot`.

use crate::observatory::collision::FileTouch;
use crate::observatory::feed::FeedLog;
use crate::observatory::risk::assess_risk;
use obscope_core::VcsAdapter;
use obscope_types::{
    Agent, AgentStatus, Collision, Operator, OperatorId, ParsedSession, PlanStatus, PlanSummary,
    RiskLevel, SessionAccumulator, Snapshot, SnapshotSummary, TaskCounts, Workstream,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything the Dashboard Builder knows about one agent session on this
/// tick, gathered by the runtime's discovery + parse-cache refresh step.
pub struct SessionInput<'a> {
    pub session: &'a ParsedSession,
    pub accumulator: &'a SessionAccumulator,
    pub operator_id: OperatorId,
    pub label: String,
    pub active: bool,
}

fn agent_status(active: bool, risk: RiskLevel, has_collision: bool) -> AgentStatus {
    if has_collision {
        return AgentStatus::Conflict;
    }
    if risk == RiskLevel::Critical || risk == RiskLevel::Elevated {
        return AgentStatus::Warning;
    }
    if active {
        AgentStatus::Busy
    } else {
        AgentStatus::Idle
    }
}

fn plan_list(session: &ParsedSession) -> Vec<PlanSummary> {
    // A plan cycle is bounded by an Entered..Exited/Rejected pair of plan
    // markers; approximate completion from task mutations seen within it.
    let mut summaries = Vec::new();
    let mut cycle_start: Option<usize> = None;
    for turn in &session.turns {
        for marker in &turn.plan_markers {
            match marker.kind {
                obscope_types::PlanMarkerKind::Entered => cycle_start = Some(turn.index),
                obscope_types::PlanMarkerKind::Exited | obscope_types::PlanMarkerKind::Rejected => {
                    if let Some(start) = cycle_start.take() {
                        let status = if marker.kind == obscope_types::PlanMarkerKind::Rejected {
                            PlanStatus::Rejected
                        } else {
                            PlanStatus::Implementing
                        };
                        let title = marker.markdown.clone().unwrap_or_else(|| "plan".to_string());
                        let task_counts = task_counts_since(session, start, turn.index);
                        summaries.push(PlanSummary {
                            id: format!("{}-{start}", session.id),
                            title,
                            status,
                            task_counts,
                        });
                    }
                }
            }
        }
    }
    summaries
}

fn task_counts_since(session: &ParsedSession, from_index: usize, to_index: usize) -> TaskCounts {
    let mut counts = TaskCounts::default();
    for turn in session.turns.iter().filter(|t| t.index >= from_index && t.index <= to_index) {
        for mutation in &turn.task_mutations {
            match mutation.kind {
                obscope_types::TaskMutationKind::Created => counts.total += 1,
                obscope_types::TaskMutationKind::Updated => match mutation.status.as_deref() {
                    Some("completed") => counts.completed += 1,
                    Some("in_progress") => counts.in_progress += 1,
                    _ => {}
                },
            }
        }
    }
    counts
}

/// Finalized plan cycles for the Plan History Index (spec §4.9), one entry
/// per Entered..Exited/Rejected pair. Unlike `plan_list`, which reports only
/// the live dashboard's current-cycle summary, this walks every closed cycle
/// in the session so the index can accumulate history across ticks.
pub fn build_plan_history_entries(session: &ParsedSession) -> Vec<obscope_types::PlanHistoryEntry> {
    let mut entries = Vec::new();
    let mut cycle_start: Option<usize> = None;
    for turn in &session.turns {
        for marker in &turn.plan_markers {
            match marker.kind {
                obscope_types::PlanMarkerKind::Entered => cycle_start = Some(turn.index),
                obscope_types::PlanMarkerKind::Exited | obscope_types::PlanMarkerKind::Rejected => {
                    if let Some(start) = cycle_start.take() {
                        let status = if marker.kind == obscope_types::PlanMarkerKind::Rejected {
                            PlanStatus::Rejected
                        } else {
                            PlanStatus::Implementing
                        };
                        let title = marker.markdown.clone().unwrap_or_else(|| "plan".to_string());
                        let task_counts = task_counts_since(session, start, turn.index);
                        let tasks: Vec<String> = session
                            .turns
                            .iter()
                            .filter(|t| t.index >= start && t.index <= turn.index)
                            .flat_map(|t| t.task_mutations.iter())
                            .filter_map(|m| m.task_id.clone())
                            .collect();
                        let start_timestamp =
                            session.turns.iter().find(|t| t.index == start).map(|t| t.timestamp);
                        let duration_ms = start_timestamp
                            .map(|start_ts| (turn.timestamp - start_ts).num_milliseconds());
                        entries.push(obscope_types::PlanHistoryEntry {
                            id: format!("{}-{start}", session.id),
                            session_id: session.id.clone(),
                            project_path: session.project_path.clone(),
                            agent_family: session.agent_family.clone(),
                            status,
                            timestamp: turn.timestamp,
                            title,
                            task_counts,
                            duration_ms,
                            markdown: marker.markdown.clone().unwrap_or_default(),
                            tasks,
                        });
                    }
                }
            }
        }
    }
    entries
}

fn current_task(session: &ParsedSession) -> Option<String> {
    session.turns.last().map(|t| t.summary.clone())
}

fn file_touches(session_id: &str, operator_id: &OperatorId, session: &ParsedSession) -> Vec<FileTouch> {
    session
        .turns
        .iter()
        .flat_map(|turn| {
            turn.changed_files().map(|path| FileTouch {
                session_id: session_id.to_string(),
                operator_id: operator_id.clone(),
                path: PathBuf::from(path),
                touched_at: turn.timestamp,
            })
        })
        .collect()
}

/// Build one tick's snapshot. `now` and `operators` are supplied by the
/// caller (the runtime's tick loop) so this stays deterministic and
/// testable without a wall clock.
pub fn build_snapshot(
    sessions: &[SessionInput<'_>],
    operators: Vec<Operator>,
    vcs: &dyn VcsAdapter,
    feed: &mut FeedLog,
    now: chrono::DateTime<chrono::Utc>,
) -> Snapshot {
    // Step 1-2: risk-assess every session and group by project for collision
    // detection and workstream rollup.
    let mut by_project: BTreeMap<PathBuf, Vec<usize>> = BTreeMap::new();
    for (i, input) in sessions.iter().enumerate() {
        let project_path = PathBuf::from(&input.session.project_path);
        by_project.entry(project_path).or_default().push(i);
    }

    let risks: Vec<_> = sessions.iter().map(|s| assess_risk(s.session, s.accumulator)).collect();

    // Step 3: per project, gather file touches and run the collision
    // detector once over the combined set.
    let mut collisions: Vec<Collision> = Vec::new();
    let mut session_has_collision = vec![false; sessions.len()];
    for (project_path, indices) in &by_project {
        let touches: Vec<FileTouch> = indices
            .iter()
            .flat_map(|&i| file_touches(&sessions[i].session.id, &sessions[i].operator_id, sessions[i].session))
            .collect();
        let project_collisions = crate::observatory::collision::detect_collisions(vcs, project_path, &touches, now);
        for collision in &project_collisions {
            for &i in indices {
                if collision.session_ids.contains(&sessions[i].session.id) {
                    session_has_collision[i] = true;
                }
            }
        }
        collisions.extend(project_collisions);
    }

    // Step 4: build per-agent entries.
    let agents: Vec<Agent> = sessions
        .iter()
        .enumerate()
        .map(|(i, input)| Agent {
            session_id: input.session.id.clone(),
            label: input.label.clone(),
            operator_id: input.operator_id.clone(),
            project_path: PathBuf::from(&input.session.project_path),
            status: agent_status(input.active, risks[i].overall, session_has_collision[i]),
            current_task: current_task(input.session),
            active: input.active,
            plan_list: plan_list(input.session),
            risk: risks[i].clone(),
        })
        .collect();

    // Step 5: roll agents up into workstreams, one per project.
    let workstreams: Vec<Workstream> = by_project
        .iter()
        .map(|(project_path, indices)| {
            let session_ids: Vec<String> = indices.iter().map(|&i| sessions[i].session.id.clone()).collect();
            let worst_risk = indices
                .iter()
                .map(|&i| risks[i].overall)
                .max()
                .unwrap_or(RiskLevel::Nominal);
            let (completed, total) = indices.iter().fold((0u32, 0u32), |(c, t), &i| {
                let counts = plan_list(sessions[i].session)
                    .into_iter()
                    .fold(TaskCounts::default(), |mut acc, p| {
                        acc.total += p.task_counts.total;
                        acc.completed += p.task_counts.completed;
                        acc
                    });
                (c + counts.completed, t + counts.total)
            });
            let completion_pct = if total > 0 { completed as f64 / total as f64 } else { 0.0 };
            Workstream {
                project_path: project_path.clone(),
                agent_session_ids: session_ids,
                completion_pct,
                risk: worst_risk,
            }
        })
        .collect();

    // Step 6: ingest this tick's turns and collisions into the feed log.
    for input in sessions {
        feed.ingest(&input.session.id, &input.session.turns, &[], now);
    }
    feed.ingest("", &[], &collisions, now);

    // Step 7: aggregate summary counters.
    let summary = SnapshotSummary {
        active_count: sessions.iter().filter(|s| s.active).count() as u32,
        collision_count: collisions.len() as u32,
        aggregate_cost: risks.iter().map(|r| r.cost).sum(),
        workstreams_at_risk: workstreams.iter().filter(|w| w.risk != RiskLevel::Nominal).count() as u32,
    };

    Snapshot {
        operators,
        agents,
        workstreams,
        collisions,
        feed: feed.entries(),
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obscope_core::{DirtyFiles, VcsAdapter};
    use obscope_types::ParsedSession;
    use chrono::Utc;

    struct AllDirtyVcs;
    impl VcsAdapter for AllDirtyVcs {
        fn last_commit_time(&self, _project_root: &Path) -> Option<chrono::DateTime<chrono::Utc>> {
            None
        }
        fn dirty_files(&self, _project_root: &Path) -> DirtyFiles {
            DirtyFiles::AllDirty
        }
    }

    fn empty_session(id: &str, project: &str) -> ParsedSession {
        ParsedSession {
            id: id.to_string(),
            project_path: project.to_string(),
            agent_family: "claude_code".to_string(),
            rollout_path: PathBuf::from(format!("{project}/{id}.jsonl")),
            created_at: Utc::now(),
            modified_at: Utc::now(),
            size_bytes: 0,
            turns: vec![],
        }
    }

    #[test]
    fn empty_input_produces_empty_snapshot() {
        let vcs = AllDirtyVcs;
        let mut feed = FeedLog::new();
        let snapshot = build_snapshot(&[], vec![], &vcs, &mut feed, Utc::now());
        assert!(snapshot.agents.is_empty());
        assert_eq!(snapshot.summary.active_count, 0);
    }

    fn turn_with_plan_marker(
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
        marker: Option<obscope_types::PlanMarker>,
    ) -> obscope_types::TurnNode {
        obscope_types::TurnNode {
            index,
            timestamp,
            category: obscope_types::TurnCategory::Task,
            summary: "do the thing".to_string(),
            full_instruction: "do the thing".to_string(),
            approach_thinking: vec![],
            decisions: vec![],
            research: vec![],
            actions: Default::default(),
            corrections: vec![],
            artifacts: vec![],
            escalations: vec![],
            tool_counts: Default::default(),
            commit: false,
            commit_subject: None,
            compaction: false,
            plan_markers: marker.into_iter().collect(),
            task_mutations: vec![],
            input_tokens: 0,
            output_tokens: 0,
            model: None,
            duration_ms: None,
            start_line: 0,
            end_line: 0,
            is_error: false,
        }
    }

    #[test]
    fn plan_history_entries_pair_entered_with_exited() {
        let now = Utc::now();
        let mut session = empty_session("s1", "/proj");
        session.turns = vec![
            turn_with_plan_marker(
                0,
                now,
                Some(obscope_types::PlanMarker {
                    kind: obscope_types::PlanMarkerKind::Entered,
                    markdown: None,
                }),
            ),
            turn_with_plan_marker(
                1,
                now + chrono::Duration::minutes(5),
                Some(obscope_types::PlanMarker {
                    kind: obscope_types::PlanMarkerKind::Exited,
                    markdown: Some("## Plan\n1. do it".to_string()),
                }),
            ),
        ];

        let entries = build_plan_history_entries(&session);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, PlanStatus::Implementing);
        assert_eq!(entries[0].duration_ms, Some(5 * 60 * 1000));
        assert_eq!(entries[0].markdown, "## Plan\n1. do it");
    }

    #[test]
    fn one_workstream_per_project() {
        let vcs = AllDirtyVcs;
        let mut feed = FeedLog::new();
        let session = empty_session("s1", "/proj");
        let accumulator = SessionAccumulator::default();
        let inputs = vec![SessionInput {
            session: &session,
            accumulator: &accumulator,
            operator_id: OperatorId::this_machine(),
            label: "s1".to_string(),
            active: true,
        }];
        let snapshot = build_snapshot(&inputs, vec![], &vcs, &mut feed, Utc::now());
        assert_eq!(snapshot.workstreams.len(), 1);
        assert_eq!(snapshot.agents.len(), 1);
        assert_eq!(snapshot.summary.active_count, 1);
    }
}
