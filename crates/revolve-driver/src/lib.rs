//! The runtime that drives a user's forward/reverse operators against a
//! scheduler and storage tiers (§4.4/§4.5): the `Driver` state machine, the
//! `Operator`/`CheckpointView` seams a caller implements, the `Profiler`
//! instrumentation, and the `SingleLevelRevolver`/`MultiLevelRevolver`
//! facades over it (§6).

mod driver;
mod facade;
mod operator;
mod profiler;
mod view;

pub use driver::{Driver, DriverMode};
pub use facade::{MultiLevelRevolver, SingleLevelOptions, SingleLevelRevolver, TierBackend, TierSpec};
pub use operator::Operator;
pub use profiler::{Profiler, ProfilerEntry, Section};
pub use view::CheckpointView;
