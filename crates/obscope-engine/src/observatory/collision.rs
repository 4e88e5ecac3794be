//! Collision Detector (spec §4.6): flags when two or more agents are about
//! to touch the same dirty file in the same project.

use obscope_core::{DirtyFiles, VcsAdapter};
use obscope_types::{Collision, CollisionSeverity, OperatorId};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A file an agent has touched recently enough to matter, paired with the
/// session/operator that touched it.
#[derive(Debug, Clone)]
pub struct FileTouch {
    pub session_id: String,
    pub operator_id: OperatorId,
    pub path: PathBuf,
    pub touched_at: DateTime<Utc>,
}

/// Files are only considered "recent" within this window of the last write;
/// older touches are assumed superseded by a commit or abandonment.
const RECENCY_WINDOW_MINUTES: i64 = 15;

/// Falls back to this floor when `VcsAdapter::last_commit_time` can't
/// determine the last commit (no repo, git failure).
fn recency_floor(vcs: &dyn VcsAdapter, project_root: &Path, now: DateTime<Utc>) -> DateTime<Utc> {
    vcs.last_commit_time(project_root)
        .unwrap_or(now - Duration::minutes(RECENCY_WINDOW_MINUTES))
}

/// Detect collisions among a project's recent file touches. Touches older
/// than the recency floor, or for files the VCS reports as clean (committed
/// since), are ignored — per §4.6, `DirtyFiles::AllDirty` (a VCS failure)
/// treats every touch as live rather than silently dropping collisions.
pub fn detect_collisions(
    vcs: &dyn VcsAdapter,
    project_root: &Path,
    touches: &[FileTouch],
    now: DateTime<Utc>,
) -> Vec<Collision> {
    let floor = recency_floor(vcs, project_root, now);
    let dirty = vcs.dirty_files(project_root);

    let mut by_path: BTreeMap<&Path, Vec<&FileTouch>> = BTreeMap::new();
    for touch in touches {
        if touch.touched_at < floor {
            continue;
        }
        if !matches!(dirty, DirtyFiles::AllDirty) && !dirty.contains(&touch.path) {
            continue;
        }
        by_path.entry(touch.path.as_path()).or_default().push(touch);
    }

    let mut collisions = Vec::new();
    for (path, mut group) in by_path {
        group.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        group.dedup_by(|a, b| a.session_id == b.session_id);

        let distinct_sessions: std::collections::BTreeSet<&str> =
            group.iter().map(|t| t.session_id.as_str()).collect();
        if distinct_sessions.len() < 2 {
            continue;
        }

        let distinct_operators: std::collections::BTreeSet<&OperatorId> =
            group.iter().map(|t| &t.operator_id).collect();

        let severity = if distinct_operators.len() > 1 {
            CollisionSeverity::Critical
        } else {
            CollisionSeverity::Warning
        };

        collisions.push(Collision {
            path: path.to_string_lossy().into_owned(),
            session_ids: group.iter().map(|t| t.session_id.clone()).collect(),
            operator_ids: distinct_operators.into_iter().cloned().collect(),
            project_path: project_root.to_path_buf(),
            severity,
            detected_at: now,
        });
    }

    collisions
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedVcs {
        last_commit: Option<DateTime<Utc>>,
        dirty: DirtyFiles,
    }

    impl VcsAdapter for FixedVcs {
        fn last_commit_time(&self, _project_root: &Path) -> Option<DateTime<Utc>> {
            self.last_commit
        }
        fn dirty_files(&self, _project_root: &Path) -> DirtyFiles {
            match &self.dirty {
                DirtyFiles::AllDirty => DirtyFiles::AllDirty,
                DirtyFiles::Known(set) => DirtyFiles::Known(set.clone()),
            }
        }
    }

    fn touch(session: &str, operator: &str, path: &str, minutes_ago: i64, now: DateTime<Utc>) -> FileTouch {
        FileTouch {
            session_id: session.to_string(),
            operator_id: OperatorId(operator.to_string()),
            path: PathBuf::from(path),
            touched_at: now - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn two_sessions_same_file_is_a_collision() {
        let now = Utc::now();
        let vcs = FixedVcs { last_commit: None, dirty: DirtyFiles::AllDirty };
        let touches = vec![
            touch("s1", "alice", "/repo/src/lib.rs", 1, now),
            touch("s2", "bob", "/repo/src/lib.rs", 2, now),
        ];
        let collisions = detect_collisions(&vcs, Path::new("/repo"), &touches, now);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].severity, CollisionSeverity::Critical);
    }

    #[test]
    fn same_operator_two_sessions_is_warning_not_critical() {
        let now = Utc::now();
        let vcs = FixedVcs { last_commit: None, dirty: DirtyFiles::AllDirty };
        let touches = vec![
            touch("s1", "alice", "/repo/src/lib.rs", 1, now),
            touch("s2", "alice", "/repo/src/lib.rs", 2, now),
        ];
        let collisions = detect_collisions(&vcs, Path::new("/repo"), &touches, now);
        assert_eq!(collisions[0].severity, CollisionSeverity::Warning);
    }

    #[test]
    fn single_session_touch_is_not_a_collision() {
        let now = Utc::now();
        let vcs = FixedVcs { last_commit: None, dirty: DirtyFiles::AllDirty };
        let touches = vec![touch("s1", "alice", "/repo/src/lib.rs", 1, now)];
        assert!(detect_collisions(&vcs, Path::new("/repo"), &touches, now).is_empty());
    }

    #[test]
    fn stale_touch_outside_recency_floor_is_ignored() {
        let now = Utc::now();
        let vcs = FixedVcs { last_commit: None, dirty: DirtyFiles::AllDirty };
        let touches = vec![
            touch("s1", "alice", "/repo/src/lib.rs", 1, now),
            touch("s2", "bob", "/repo/src/lib.rs", 60, now),
        ];
        assert!(detect_collisions(&vcs, Path::new("/repo"), &touches, now).is_empty());
    }

    #[test]
    fn committed_file_not_in_dirty_set_is_ignored() {
        let now = Utc::now();
        let vcs = FixedVcs {
            last_commit: None,
            dirty: DirtyFiles::Known(std::collections::BTreeSet::new()),
        };
        let touches = vec![
            touch("s1", "alice", "/repo/src/lib.rs", 1, now),
            touch("s2", "bob", "/repo/src/lib.rs", 2, now),
        ];
        assert!(detect_collisions(&vcs, Path::new("/repo"), &touches, now).is_empty());
    }
}
