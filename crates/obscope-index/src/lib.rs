//! Persistent, process-restart-surviving state for the observatory: the
//! Plan History Index (finalized plan cycles, spec §4.9) and the session
//! label store (spec §3/§4.1). Both are single JSON documents written
//! atomically; neither is a database — no query engine, no schema migration.

mod atomic;
pub mod error;
mod labels;
mod plan_history;

pub use labels::LabelStore;
pub use plan_history::{DiscoveredSession, ListQuery, ListResult, PlanHistoryIndex, SessionPlansView};
