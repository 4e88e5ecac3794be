//! Re-export session types from obscope-types.
//!
//! All session-related types have been moved to obscope-types to improve
//! architecture clarity and reduce dependency weight for consumers that
//! only need data structures without assembly logic.

pub use obscope_types::{
    AgentSession, AgentStep, AgentTurn, MessageBlock, ReasoningBlock, SessionStats, StepStatus,
    ToolCallBlock, ToolExecution, ToolResultBlock, TurnMetrics, TurnStats, UserMessage,
};
