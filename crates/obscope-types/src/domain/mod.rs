pub mod observatory;
pub mod project;
pub mod session;
pub mod token_usage;
pub mod turn_node;

pub use observatory::*;
pub use project::*;
pub use session::*;
pub use token_usage::*;
pub use turn_node::*;
