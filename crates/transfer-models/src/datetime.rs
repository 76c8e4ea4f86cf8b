//! Acquisition datetime
//!
//! Accepts the handful of layouts form renderers actually produce and
//! serializes back to ISO-8601 without fractional seconds.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Metadata, Schema, SchemaObject, StringValidation};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Layouts accepted on input, tried in order
const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    // Renderers that drop seconds
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %I:%M:%S %p",
];

const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const PREFIX_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Schema-level shape check; calendar validity is left to parsing.
const PATTERN: &str =
    r"^(\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}(:\d{2})?|\d{1,2}/\d{1,2}/\d{4} \d{1,2}:\d{2}:\d{2} [APap][Mm])$";

/// Datetime the data was acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AcqDateTime(NaiveDateTime);

impl AcqDateTime {
    #[inline]
    #[must_use]
    pub fn new(value: NaiveDateTime) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Timestamp segment used in upload prefixes
    #[must_use]
    pub fn prefix_stamp(&self) -> String {
        self.0.format(PREFIX_FORMAT).to_string()
    }
}

/// Unparseable acquisition datetime
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("incorrect datetime format '{0}', should be YYYY-MM-DD HH:mm:ss or MM/DD/YYYY H:MM:SS AM/PM")]
pub struct DateTimeError(pub String);

impl FromStr for AcqDateTime {
    type Err = DateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        INPUT_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .map(Self)
            .ok_or_else(|| DateTimeError(s.to_owned()))
    }
}

impl fmt::Display for AcqDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(OUTPUT_FORMAT))
    }
}

impl Serialize for AcqDateTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AcqDateTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for AcqDateTime {
    fn schema_name() -> String {
        "AcqDateTime".to_owned()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            metadata: Some(Box::new(Metadata {
                description: Some("Datetime data was acquired".to_owned()),
                ..Default::default()
            })),
            instance_type: Some(InstanceType::String.into()),
            string: Some(Box::new(StringValidation {
                pattern: Some(PATTERN.to_owned()),
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> AcqDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn accepts_space_and_t_separators() {
        assert_eq!(parse("2024-03-01 12:30:00"), parse("2024-03-01T12:30:00"));
    }

    #[test]
    fn accepts_missing_seconds() {
        assert_eq!(parse("2024-03-01 12:30"), parse("2024-03-01 12:30:00"));
    }

    #[test]
    fn accepts_us_layout() {
        assert_eq!(parse("03/01/2024 01:30:00 PM"), parse("2024-03-01 13:30:00"));
    }

    #[test]
    fn rejects_calendar_nonsense() {
        assert!("2024-13-01 12:30:00".parse::<AcqDateTime>().is_err());
        assert!("yesterday".parse::<AcqDateTime>().is_err());
    }

    #[test]
    fn display_is_iso() {
        assert_eq!(parse("2024-03-01 12:30:05").to_string(), "2024-03-01T12:30:05");
    }

    #[test]
    fn prefix_stamp_uses_dashes() {
        assert_eq!(parse("2024-03-01 12:30:05").prefix_stamp(), "2024-03-01_12-30-05");
    }

    #[test]
    fn schema_pattern_matches_accepted_layouts() {
        let pattern = regex::Regex::new(PATTERN).unwrap();
        assert!(pattern.is_match("2024-03-01 12:30:00"));
        assert!(pattern.is_match("2024-03-01T12:30"));
        assert!(pattern.is_match("3/1/2024 1:30:00 pm"));
        assert!(!pattern.is_match("2024/03/01"));
    }
}
