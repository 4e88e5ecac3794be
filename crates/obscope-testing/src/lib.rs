//! Internal testing utilities shared by the CLI's integration tests and by
//! other crates' `tests/` directories: synthetic rollout generation, fake
//! adapter implementations, and background process management, so a test
//! can stand up a fake `~/.claude/projects/...` tree and drive a `Daemon`
//! without shelling out to `git`, `lsof`, or spawning a real uplink.

pub mod fakes;
pub mod fixtures;
pub mod process;

pub use fakes::{FakeProcessInspector, FakeVcsAdapter};
pub use fixtures::{encode_claude_project_dir, ClaudeRolloutBuilder, CodexRolloutBuilder};
pub use process::BackgroundProcess;
