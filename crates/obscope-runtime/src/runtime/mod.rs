pub mod discovery;
pub mod fanout;
pub mod tick;

pub use discovery::{DiscoveredRollout, Discovery};
pub use fanout::{
    PushMessage, SnapshotBus, UplinkClientMessage, UplinkConnection, UplinkError, UplinkManager,
    UplinkResult, UplinkServerMessage, UplinkStatus, UplinkTransport, UplinkWorker,
};
pub use tick::{Daemon, WatchedRoot};
