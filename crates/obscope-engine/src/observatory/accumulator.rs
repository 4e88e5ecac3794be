//! Parse Cache & Accumulator (spec §4.4): memoizes parsed sessions by
//! `(path, mtime)` and maintains the per-session compaction-safe carry
//! forward.

use obscope_types::{ParsedSession, SessionAccumulator};
use std::collections::HashMap;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
struct CacheEntry {
    mtime_ms: i64,
    size_bytes: u64,
    session: ParsedSession,
    accumulator: SessionAccumulator,
}

/// Computes the carry-forward counters a single parse, taken in isolation,
/// would contribute (no history — that's the accumulator's job).
pub fn accumulator_delta(session: &ParsedSession) -> SessionAccumulator {
    let mut delta = SessionAccumulator {
        total_turns: session.turns.len() as u64,
        ..Default::default()
    };
    for turn in &session.turns {
        delta.tool_calls += turn.tool_counts.values().sum::<u64>();
        if turn.commit {
            delta.commits += 1;
        }
        if turn.compaction {
            delta.compactions += 1;
        }
        if turn.is_error {
            delta.error_turns += 1;
        }
        if !turn.corrections.is_empty() {
            delta.correction_turns += 1;
        }
        delta.tokens += turn.input_tokens + turn.output_tokens;
        delta.changed_files.extend(turn.changed_files().map(str::to_string));
        for (tool, count) in &turn.tool_counts {
            *delta.tool_counts.entry(tool.clone()).or_insert(0) += count;
        }
        delta.error_trend.push(turn.is_error);
    }
    delta
}

/// Sum two accumulators field-by-field (used across a compaction boundary,
/// where the current parse is a disjoint delta rather than a superset).
fn sum_accumulators(base: &SessionAccumulator, delta: &SessionAccumulator) -> SessionAccumulator {
    let mut out = base.clone();
    out.total_turns += delta.total_turns;
    out.tool_calls += delta.tool_calls;
    out.commits += delta.commits;
    out.error_turns += delta.error_turns;
    out.correction_turns += delta.correction_turns;
    out.tokens += delta.tokens;
    out.cost = out.cost.max(delta.cost);
    out.changed_files.extend(delta.changed_files.iter().cloned());
    for (tool, count) in &delta.tool_counts {
        *out.tool_counts.entry(tool.clone()).or_insert(0) += count;
    }
    if !delta.plan_cycles.is_empty() {
        out.plan_cycles = delta.plan_cycles.clone();
    }
    let mut trend = out.error_trend.clone();
    trend.extend(delta.error_trend.iter().copied());
    out.error_trend = trend;
    out
}

/// Cache entries keyed by session id, holding `{mtime, parsed}` plus the
/// accumulator that survives across re-parses and compactions.
#[derive(Default)]
pub struct ParseCache {
    entries: HashMap<String, CacheEntry>,
}

/// What the cache hands back for a session on a given tick: the freshly
/// parsed session plus the externally reported (compaction-safe) counters.
pub struct RefreshedSession<'a> {
    pub session: &'a ParsedSession,
    pub accumulator: &'a SessionAccumulator,
    pub compacted_this_tick: bool,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the cache entry for `session_id`. `parse` is only invoked if
    /// `mtime_ms`/`size_bytes` changed since the last call (step 1 of §4.4).
    pub fn refresh<F>(
        &mut self,
        session_id: &str,
        mtime_ms: i64,
        size_bytes: u64,
        parse: F,
    ) -> RefreshedSession<'_>
    where
        F: FnOnce() -> ParsedSession,
    {
        let unchanged = self
            .entries
            .get(session_id)
            .is_some_and(|e| e.mtime_ms == mtime_ms && e.size_bytes == size_bytes);

        if !unchanged {
            let current_session = parse();
            let current_delta = accumulator_delta(&current_session);

            let (merged, compacted) = match self.entries.get(session_id) {
                Some(prev) => {
                    let compacted = prev.accumulator.total_turns > current_delta.total_turns;
                    let merged = if compacted {
                        let mut baseline = prev.accumulator.clone();
                        baseline.compactions += 1;
                        sum_accumulators(&baseline, &current_delta)
                    } else {
                        let mut merged = prev.accumulator.clone();
                        merged.absorb(&current_delta);
                        merged
                    };
                    (merged, compacted)
                }
                None => (current_delta, false),
            };

            self.entries.insert(
                session_id.to_string(),
                CacheEntry {
                    mtime_ms,
                    size_bytes,
                    session: current_session,
                    accumulator: merged,
                },
            );

            let entry = &self.entries[session_id];
            return RefreshedSession {
                session: &entry.session,
                accumulator: &entry.accumulator,
                compacted_this_tick: compacted,
            };
        }

        let entry = &self.entries[session_id];
        RefreshedSession {
            session: &entry.session,
            accumulator: &entry.accumulator,
            compacted_this_tick: false,
        }
    }

    pub fn known_session_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn evict_missing(&mut self, current_ids: &BTreeSet<String>) {
        self.entries.retain(|id, _| current_ids.contains(id));
    }
}
