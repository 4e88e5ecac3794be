//! Discovery (spec §4.1): enumerate rollout files per agent family and tag
//! which ones are currently active by cross-referencing running processes.

use obscope_core::ProcessInspector;
use obscope_providers::traits::LogProvider;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// A session confirmed active on tick T stays active through T+1 if it was
/// modified within this long, so one session ending and another starting in
/// the same directory doesn't flicker.
const GRACE_BUFFER_SECONDS: i64 = 30;

/// Rollouts from a project with ≥1 active session stay visible this long
/// even once they go quiet, so recent-but-dormant sessions aren't dropped.
const DORMANT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct DiscoveredRollout {
    pub provider_id: &'static str,
    pub session_id: String,
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
    pub active: bool,
}

/// Process command name Discovery asks the inspector for, keyed by
/// `LogProvider::id()`.
fn process_command_name(provider_id: &str) -> &str {
    match provider_id {
        "codex" => "codex",
        other => other,
    }
}

fn mtime(path: &std::path::Path) -> Option<DateTime<Utc>> {
    let metadata = std::fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

pub struct Discovery {
    previously_active: HashSet<String>,
}

impl Discovery {
    pub fn new() -> Self {
        Self { previously_active: HashSet::new() }
    }

    /// One discovery tick for a single provider over `log_root`. Static
    /// enumeration comes from the provider's own `scan_sessions`; active
    /// detection and the grace buffer/dormant expansion are applied here.
    pub fn discover(
        &mut self,
        provider: &dyn LogProvider,
        log_root: &std::path::Path,
        inspector: &dyn ProcessInspector,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DiscoveredRollout>> {
        let sessions = provider.scan_sessions(log_root)?;
        let mut rollouts: Vec<DiscoveredRollout> = sessions
            .into_iter()
            .filter_map(|idx| {
                let modified_at = mtime(&idx.main_file)?;
                Some(DiscoveredRollout {
                    provider_id: provider.id(),
                    session_id: idx.session_id,
                    path: idx.main_file,
                    modified_at,
                    active: false,
                })
            })
            .collect();

        let active_ids = self.detect_active(provider, &rollouts, inspector, now);
        for rollout in &mut rollouts {
            rollout.active = active_ids.contains(&rollout.session_id);
        }

        let has_active = rollouts.iter().any(|r| r.active);
        let dormant_cutoff = now - ChronoDuration::hours(DORMANT_WINDOW_HOURS);
        if has_active {
            rollouts.retain(|r| r.active || r.modified_at >= dormant_cutoff);
        }

        Ok(rollouts)
    }

    fn detect_active(
        &mut self,
        provider: &dyn LogProvider,
        rollouts: &[DiscoveredRollout],
        inspector: &dyn ProcessInspector,
        now: DateTime<Utc>,
    ) -> HashSet<String> {
        let processes = inspector.list_running_agents(process_command_name(provider.id()));
        let mut active: HashSet<String> = HashSet::new();
        let mut by_cwd: HashMap<PathBuf, usize> = HashMap::new();

        for proc in &processes {
            let mut matched_by_fd = false;
            for file in &proc.open_files {
                if let Some(rollout) = rollouts.iter().find(|r| &r.path == file) {
                    active.insert(rollout.session_id.clone());
                    matched_by_fd = true;
                }
            }
            if !matched_by_fd {
                if let Some(cwd) = &proc.cwd {
                    *by_cwd.entry(cwd.clone()).or_insert(0) += 1;
                }
            }
        }

        for (cwd, count) in by_cwd {
            let Some(project_log_root) = provider.resolve_log_root(&cwd) else {
                continue;
            };
            let mut under_project: Vec<&DiscoveredRollout> = rollouts
                .iter()
                .filter(|r| r.path.starts_with(&project_log_root))
                .collect();
            under_project.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
            for rollout in under_project.into_iter().take(count) {
                active.insert(rollout.session_id.clone());
            }
        }

        for rollout in rollouts {
            if active.contains(&rollout.session_id) {
                continue;
            }
            if self.previously_active.contains(&rollout.session_id)
                && now - rollout.modified_at <= ChronoDuration::seconds(GRACE_BUFFER_SECONDS)
            {
                active.insert(rollout.session_id.clone());
            }
        }

        self.previously_active = active.clone();
        active
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obscope_core::RunningAgentProcess;
    use obscope_providers::traits::{ProbeResult, SessionIndex};
    use std::path::Path;
    use tempfile::TempDir;

    struct FixedProvider {
        sessions: Vec<SessionIndex>,
        log_root: PathBuf,
    }

    impl LogProvider for FixedProvider {
        fn id(&self) -> &'static str {
            "fixed"
        }
        fn probe(&self, _path: &Path) -> ProbeResult {
            ProbeResult::match_high()
        }
        fn resolve_log_root(&self, _project_root: &Path) -> Option<PathBuf> {
            Some(self.log_root.clone())
        }
        fn scan_sessions(&self, _log_root: &Path) -> anyhow::Result<Vec<SessionIndex>> {
            Ok(self.sessions.clone())
        }
        fn extract_session_id(&self, _path: &Path) -> anyhow::Result<String> {
            anyhow::bail!("unused")
        }
        fn find_session_files(&self, _log_root: &Path, _session_id: &str) -> anyhow::Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    struct FixedInspector(Vec<RunningAgentProcess>);
    impl ProcessInspector for FixedInspector {
        fn list_running_agents(&self, _command_name: &str) -> Vec<RunningAgentProcess> {
            self.0.clone()
        }
    }

    fn write_session(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "{}").unwrap();
        path
    }

    #[test]
    fn fd_match_marks_session_active() {
        let dir = TempDir::new().unwrap();
        let file = write_session(&dir, "s1.jsonl");
        let provider = FixedProvider {
            sessions: vec![SessionIndex {
                session_id: "s1".to_string(),
                timestamp: None,
                main_file: file.clone(),
                sidechain_files: vec![],
            }],
            log_root: dir.path().to_path_buf(),
        };
        let inspector = FixedInspector(vec![RunningAgentProcess {
            pid: 1,
            cwd: None,
            open_files: vec![file],
        }]);

        let mut discovery = Discovery::new();
        let result = discovery
            .discover(&provider, dir.path(), &inspector, Utc::now())
            .unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].active);
    }

    #[test]
    fn dormant_session_dropped_when_no_active_session_in_project() {
        let dir = TempDir::new().unwrap();
        let file = write_session(&dir, "s1.jsonl");
        let provider = FixedProvider {
            sessions: vec![SessionIndex {
                session_id: "s1".to_string(),
                timestamp: None,
                main_file: file,
                sidechain_files: vec![],
            }],
            log_root: dir.path().to_path_buf(),
        };
        let inspector = FixedInspector(vec![]);

        let mut discovery = Discovery::new();
        let result = discovery
            .discover(&provider, dir.path(), &inspector, Utc::now())
            .unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result[0].active);
    }

    #[test]
    fn grace_buffer_keeps_recently_active_session_through_next_tick() {
        let dir = TempDir::new().unwrap();
        let file = write_session(&dir, "s1.jsonl");
        let provider = FixedProvider {
            sessions: vec![SessionIndex {
                session_id: "s1".to_string(),
                timestamp: None,
                main_file: file.clone(),
                sidechain_files: vec![],
            }],
            log_root: dir.path().to_path_buf(),
        };
        let now = Utc::now();

        let mut discovery = Discovery::new();
        let with_process = FixedInspector(vec![RunningAgentProcess {
            pid: 1,
            cwd: None,
            open_files: vec![file],
        }]);
        let first = discovery
            .discover(&provider, dir.path(), &with_process, now)
            .unwrap();
        assert!(first[0].active);

        let no_process = FixedInspector(vec![]);
        let second = discovery
            .discover(&provider, dir.path(), &no_process, now + ChronoDuration::seconds(5))
            .unwrap();
        assert!(second[0].active, "grace buffer should keep the session active one tick later");
    }
}
