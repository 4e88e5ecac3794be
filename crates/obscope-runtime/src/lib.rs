//! Runtime layer: Discovery, the tick loop (Parse Cache → Accumulator →
//! Dashboard Builder), Fan-out (local subscribers + uplinks), and on-disk
//! configuration (operators, relay targets).

pub mod config;
pub mod error;
pub mod runtime;

pub use config::{expand_operators, resolve_workspace_path, OperatorConfig, OperatorEntry, RelayConfig, UplinkTarget};
pub use error::{Error, Result};
pub use runtime::{
    Daemon, DiscoveredRollout, Discovery, PushMessage, SnapshotBus, UplinkClientMessage,
    UplinkConnection, UplinkError, UplinkManager, UplinkResult, UplinkServerMessage, UplinkStatus,
    UplinkTransport, UplinkWorker, WatchedRoot,
};
