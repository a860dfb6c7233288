//! Publishing runtime: the periodic publisher and the server lifecycle around it

pub mod lifecycle;
pub mod publisher;

pub use lifecycle::{LifecycleError, SensorServer};
pub use publisher::{interruptible_sleep, PublishStats, Publisher, TickOutcome};
