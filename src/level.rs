//! Severity levels understood by log2console viewers.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Ordered severity of a [`LogEvent`](crate::LogEvent).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
#[repr(u8)]
pub enum Severity {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

/// Returned when a string does not name a known severity.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown severity: {0}")]
pub struct ParseSeverityError(pub String);

impl Severity {
    /// Every severity in ascending order.
    pub const ALL: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Look up a severity by its raw discriminant.
    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }

    /// Upper-case name shared by both wire formats.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "FATAL" | "CRITICAL" => Ok(Self::Fatal),
            _ => Err(ParseSeverityError(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = ParseSeverityError;

    fn try_from(value: String) -> Result<Self, ParseSeverityError> {
        value.parse()
    }
}

/// Level name used by the plain-text format for a raw discriminant.
///
/// Values outside the six known levels render as `UNKNOWN`.
pub fn plain_level_name(raw: u8) -> &'static str {
    Severity::from_raw(raw).map_or("UNKNOWN", Severity::as_str)
}

/// Level name used by the log4j `level` attribute for a raw discriminant.
///
/// Viewers reject unknown levels, so anything out of range is sent as `INFO`.
pub fn log4j_level_name(raw: u8) -> &'static str {
    Severity::from_raw(raw).map_or("INFO", Severity::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn severities_are_ordered() {
        assert!(Severity::Trace < Severity::Debug);
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[rstest]
    #[case("trace", Severity::Trace)]
    #[case("Warning", Severity::Warn)]
    #[case(" ERROR ", Severity::Error)]
    #[case("critical", Severity::Fatal)]
    fn parses_names(#[case] input: &str, #[case] expected: Severity) {
        assert_eq!(input.parse::<Severity>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_names() {
        assert_eq!(
            "verbose".parse::<Severity>(),
            Err(ParseSeverityError("verbose".into()))
        );
    }

    #[rstest]
    fn converts_from_owned_strings() {
        assert_eq!(Severity::try_from(String::from("fatal")), Ok(Severity::Fatal));
        assert_eq!(
            Severity::try_from(String::from("loud")),
            Err(ParseSeverityError("loud".into()))
        );
        let level: Severity = serde_json::from_str("\"warn\"").expect("valid level");
        assert_eq!(level, Severity::Warn);
    }

    #[rstest]
    fn raw_values_round_trip() {
        for level in Severity::ALL {
            assert_eq!(Severity::from_raw(level as u8), Some(level));
        }
        assert_eq!(Severity::from_raw(6), None);
    }

    #[rstest]
    #[case(0, "TRACE", "TRACE")]
    #[case(5, "FATAL", "FATAL")]
    #[case(6, "UNKNOWN", "INFO")]
    #[case(u8::MAX, "UNKNOWN", "INFO")]
    fn out_of_range_names_differ_per_format(
        #[case] raw: u8,
        #[case] plain: &str,
        #[case] log4j: &str,
    ) {
        assert_eq!(plain_level_name(raw), plain);
        assert_eq!(log4j_level_name(raw), log4j);
    }
}
