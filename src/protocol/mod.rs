//! Wire-level types: reading payloads and topic addressing

pub mod reading;
pub mod topics;

pub use reading::{
    parse_timestamp, AirQuality, CarbonDioxide, Environment, Formaldehyde, Measurements,
    Particulates, Reading, TIMESTAMP_FORMAT,
};
pub use topics::{validate_base_topic, validate_topic_segment, TopicAddress, ValidationError};
