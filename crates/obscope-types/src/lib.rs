//! Normalized event and session schema shared by every provider and by the
//! session-assembly engine.
//!
//! `event` is the provider-agnostic wire schema a `SessionParser` produces
//! (one `AgentEvent` per rollout record). `domain` is the assembled view
//! built from a stream of events: `AgentSession` -> `AgentTurn` ->
//! `AgentStep` -> `ToolExecution`. `tool` normalizes tool-call arguments
//! across providers into typed variants.

pub mod domain;
pub mod event;
pub mod tool;
pub mod util;

pub use domain::*;
pub use event::*;
pub use tool::*;
pub use util::*;
