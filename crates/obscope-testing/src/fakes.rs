//! Deterministic test doubles for the adapter traits in `obscope-core`, so
//! integration tests can drive a `Daemon` without shelling out to `git` or
//! `lsof`.

use chrono::{DateTime, Utc};
use obscope_core::{DirtyFiles, RunningAgentProcess, VcsAdapter};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A `VcsAdapter` backed by an in-memory table instead of real git state.
#[derive(Default)]
pub struct FakeVcsAdapter {
    commits: Mutex<HashMap<PathBuf, DateTime<Utc>>>,
    dirty: Mutex<HashMap<PathBuf, DirtyFiles>>,
}

impl FakeVcsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_last_commit(&self, project_root: impl Into<PathBuf>, at: DateTime<Utc>) -> &Self {
        self.commits.lock().unwrap().insert(project_root.into(), at);
        self
    }

    pub fn set_dirty_files(&self, project_root: impl Into<PathBuf>, dirty: DirtyFiles) -> &Self {
        self.dirty.lock().unwrap().insert(project_root.into(), dirty);
        self
    }
}

impl VcsAdapter for FakeVcsAdapter {
    fn last_commit_time(&self, project_root: &Path) -> Option<DateTime<Utc>> {
        self.commits.lock().unwrap().get(project_root).copied()
    }

    fn dirty_files(&self, project_root: &Path) -> DirtyFiles {
        self.dirty
            .lock()
            .unwrap()
            .get(project_root)
            .cloned()
            .unwrap_or(DirtyFiles::AllDirty)
    }
}

/// A `ProcessInspector` returning a fixed, caller-configured process list
/// instead of shelling out to `lsof`.
#[derive(Default)]
pub struct FakeProcessInspector {
    agents: Mutex<Vec<RunningAgentProcess>>,
}

impl FakeProcessInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_running(&self, agents: Vec<RunningAgentProcess>) -> &Self {
        *self.agents.lock().unwrap() = agents;
        self
    }
}

impl obscope_core::ProcessInspector for FakeProcessInspector {
    fn list_running_agents(&self, _command_name: &str) -> Vec<RunningAgentProcess> {
        self.agents.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_vcs_adapter_returns_configured_commit_time() {
        let adapter = FakeVcsAdapter::new();
        let at = Utc::now();
        adapter.set_last_commit("/proj", at);
        assert_eq!(adapter.last_commit_time(Path::new("/proj")), Some(at));
        assert_eq!(adapter.last_commit_time(Path::new("/other")), None);
    }

    #[test]
    fn fake_vcs_adapter_defaults_to_all_dirty() {
        let adapter = FakeVcsAdapter::new();
        assert!(adapter.dirty_files(Path::new("/proj")).contains(Path::new("/proj/whatever.rs")));
    }
}
