// Engine module - Session reconstruction and analysis logic.
// This layer sits between normalized events (obscope-types) and presentation/runtime.

pub mod observatory;
pub mod session;

pub use obscope_types::{ContextLimit, ContextWindowUsage, TokenCount};
pub use observatory::{
    accumulator_delta, assess_risk, build_parsed_session, build_plan_history_entries,
    build_snapshot, build_turn_node, classify_category, detect_collisions, FeedLog, FileTouch,
    ParseCache, RefreshedSession, SessionInput,
};
pub use session::{
    assemble_session, assemble_sessions, summarize, AgentSession, AgentStep, AgentTurn,
    MessageBlock, ReasoningBlock, SessionStats, SessionSummary, StepStatus, ToolCallBlock,
    ToolExecution, ToolResultBlock, TurnMetrics, TurnStats, UserMessage,
};
