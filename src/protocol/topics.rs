//! Topic addressing and segment validation
//!
//! Readings are published to `{base_topic}/{sensor_kind}/{sensor_identity}`.
//! Every segment comes from configuration and must be a lowercase ASCII token.

use std::fmt;
use thiserror::Error;

/// Address a reading is published to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicAddress(String);

impl TopicAddress {
    /// Build `base_topic/kind/identity`
    ///
    /// The base topic may itself contain several levels (`home/sensors`).
    /// Parts are joined as given; [`validate_base_topic`] rejects empty levels.
    pub fn new(base_topic: &str, kind: &str, identity: &str) -> Self {
        Self(format!("{base_topic}/{kind}/{identity}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TopicAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a single topic segment: `[a-z0-9_-]+`
pub fn validate_topic_segment(segment: &str) -> Result<(), ValidationError> {
    if segment.is_empty() {
        return Err(ValidationError::EmptySegment);
    }

    for ch in segment.chars() {
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-') {
            return Err(ValidationError::InvalidSegmentChar {
                segment: segment.to_string(),
                ch,
            });
        }
    }

    Ok(())
}

/// Validate a base topic: one or more `/`-separated segments
///
/// A leading or trailing `/` is an empty level and is rejected.
pub fn validate_base_topic(base_topic: &str) -> Result<(), ValidationError> {
    base_topic.split('/').try_for_each(validate_topic_segment)
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Topic segment cannot be empty")]
    EmptySegment,
    #[error("Topic segment '{segment}' contains invalid character '{ch}' (expected [a-z0-9_-])")]
    InvalidSegmentChar { segment: String, ch: char },
}
