//! Stream Tags — Metadata attached to sample offsets
//!
//! Tagged-stream processing chains carry key-value metadata alongside the
//! sample data. A tag is attached to a specific sample offset and travels
//! downstream with it. This crate uses tags to describe the pre-attached
//! packet-length marker on a training source: the tag sits at offset 0 and
//! its integer value equals the length of the training sequence, so the
//! downstream multiplexer knows how many samples form the preamble.
//! GNU Radio equivalent: `gr::tag_t` built via `tag_utils`.
//!
//! ## Example
//!
//! ```rust
//! use mimo_encoder::stream_tags::{StreamTag, TagValue};
//!
//! let tag = StreamTag::length_tag("packet_len", 64);
//! assert_eq!(tag.offset, 0);
//! assert_eq!(tag.value.as_int(), Some(64));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag value — typed metadata attached to a sample offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    /// Boolean flag (burst_start, burst_end, etc.)
    Bool(bool),
    /// Integer value (packet length, symbol index, etc.)
    Int(i64),
    /// Floating-point value (frequency, timing, etc.)
    Float(f64),
    /// String value (modulation name, block ID, etc.)
    String(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(v) => write!(f, "{v}"),
            TagValue::Int(v) => write!(f, "{v}"),
            TagValue::Float(v) => write!(f, "{v:.6}"),
            TagValue::String(v) => write!(f, "\"{v}\""),
        }
    }
}

impl TagValue {
    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            TagValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            TagValue::Float(v) => Some(*v),
            TagValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::String(v) => Some(v),
            _ => None,
        }
    }
}

/// A metadata tag attached to a specific offset within a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamTag {
    /// Sample offset where the tag applies.
    pub offset: u64,
    /// Tag key identifying the metadata type.
    pub key: String,
    /// Tag value carrying the metadata payload.
    pub value: TagValue,
}

impl StreamTag {
    /// Create a tag at an arbitrary offset.
    pub fn new(offset: u64, key: &str, value: TagValue) -> Self {
        Self {
            offset,
            key: key.to_string(),
            value,
        }
    }

    /// Create a packet-length tag at offset 0.
    ///
    /// This is the marker a repeating training source carries so that the
    /// tagged-stream mux downstream treats each repetition as one packet of
    /// `len` samples.
    pub fn length_tag(key: &str, len: usize) -> Self {
        Self::new(0, key, TagValue::Int(len as i64))
    }
}

impl fmt::Display for StreamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} {}={}", self.offset, self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_tag() {
        let tag = StreamTag::length_tag("length", 32);
        assert_eq!(tag.offset, 0);
        assert_eq!(tag.key, "length");
        assert_eq!(tag.value, TagValue::Int(32));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(TagValue::Int(7).as_int(), Some(7));
        assert_eq!(TagValue::Int(7).as_float(), Some(7.0));
        assert_eq!(TagValue::Float(1.5).as_float(), Some(1.5));
        assert_eq!(TagValue::Bool(true).as_bool(), Some(true));
        assert_eq!(TagValue::String("qpsk".into()).as_str(), Some("qpsk"));
        assert_eq!(TagValue::Bool(true).as_int(), None);
    }

    #[test]
    fn test_display() {
        let tag = StreamTag::new(100, "burst_start", TagValue::Bool(true));
        assert_eq!(tag.to_string(), "@100 burst_start=true");
        let tag = StreamTag::length_tag("len", 4);
        assert_eq!(tag.to_string(), "@0 len=4");
    }

    #[test]
    fn test_serde_roundtrip() {
        let tag = StreamTag::length_tag("length", 16);
        let yaml = serde_yaml::to_string(&tag).unwrap();
        let back: StreamTag = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(tag, back);
    }
}
