//! Internal core infrastructure for the obscope daemon: project path
//! helpers and the adapter traits that keep the observability pipeline
//! decoupled from the OS, VCS, and at-rest secret storage.

pub mod adapters;
pub mod path;

pub use adapters::*;
pub use path::*;
