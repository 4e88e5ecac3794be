pub mod args;
pub mod call;
pub mod kind;

pub use args::{ExecuteArgs, FileEditArgs, FileReadArgs, FileWriteArgs, McpArgs, SearchArgs};
pub use call::ToolCallPayload;
pub use kind::{ToolKind, ToolOrigin};
