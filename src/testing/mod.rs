//! Testing utilities and mock implementations
//!
//! Lets the simulator be exercised without an MQTT broker or real sensors.

pub mod mocks;

pub use mocks::*;
