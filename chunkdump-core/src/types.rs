//! Core types for chunkdump

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

/// Timestamp in milliseconds since Unix epoch
pub type Timestamp = i64;

/// A single decoded sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Timestamp in milliseconds
    pub timestamp: Timestamp,
    /// Sample value
    pub value: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Timestamp as a UTC date, if chrono can represent it
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// RFC 3339 rendering at second precision, falling back to raw milliseconds
    pub fn rfc3339(&self) -> String {
        match self.time() {
            Some(time) => time.to_rfc3339_opts(SecondsFormat::Secs, true),
            None => format!("{}ms", self.timestamp),
        }
    }

    /// Bitwise equality, so NaN payloads and signed zeros compare exactly
    pub fn bit_eq(&self, other: &Sample) -> bool {
        self.timestamp == other.timestamp && self.value.to_bits() == other.value.to_bits()
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.rfc3339(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rfc3339_utc() {
        let sample = Sample::new(1_600_000_000_123, 23.5);
        assert_eq!(sample.to_string(), "2020-09-13T12:26:40Z, 23.5");
    }

    #[test]
    fn test_negative_timestamp() {
        let sample = Sample::new(-1, 0.0);
        assert_eq!(sample.rfc3339(), "1969-12-31T23:59:59Z");
    }

    #[test]
    fn test_out_of_range_timestamp() {
        let sample = Sample::new(i64::MAX, 1.0);
        assert_eq!(sample.time(), None);
        assert_eq!(sample.rfc3339(), format!("{}ms", i64::MAX));
    }

    #[test]
    fn test_bit_eq_distinguishes_zero_signs() {
        let a = Sample::new(5, 0.0);
        let b = Sample::new(5, -0.0);
        assert_eq!(a, b);
        assert!(!a.bit_eq(&b));

        let nan = Sample::new(5, f64::NAN);
        assert!(nan.bit_eq(&nan));
    }
}
