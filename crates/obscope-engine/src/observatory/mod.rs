//! Observatory pipeline: Turn Builder, Parse Cache & Accumulator, Risk
//! Engine, Collision Detector, Feed Log, and the Dashboard Builder that
//! assembles them into one per-tick `Snapshot`.

pub mod accumulator;
pub mod collision;
pub mod dashboard;
pub mod feed;
pub mod risk;
pub mod turn_classifier;

pub use accumulator::{accumulator_delta, ParseCache, RefreshedSession};
pub use collision::{detect_collisions, FileTouch};
pub use dashboard::{build_plan_history_entries, build_snapshot, SessionInput};
pub use feed::FeedLog;
pub use risk::assess_risk;
pub use turn_classifier::{build_parsed_session, build_turn_node, classify_category};
