//! Board manufacturing date
//!
//! The board info area stores its manufacturing date as the number of minutes
//! since 1996-01-01 00:00, as a 24-bit little-endian value.

use core::fmt::{self, Display};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest minute count that fits into the three date bytes.
pub const MAX_MINUTES: u32 = 0x00ff_ffff;

pub const EPOCH: NaiveDateTime = match NaiveDate::from_ymd_opt(1996, 1, 1) {
    Some(d) => NaiveDateTime::new(d, NaiveTime::MIN),
    None => panic!("invalid FRU epoch"),
};

#[derive(Debug, Error)]
pub enum DateError {
    #[error("cannot parse date '{input}', expected YYYY-MM-DD HH:MM:SS: {source}")]
    Format {
        input: String,
        source: chrono::ParseError,
    },
    #[error("date {0} does not fit into 24 bits of minutes since 1996-01-01 00:00")]
    OutOfRange(String),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MfgDate {
    pub minutes: u32,
    pub formatted: String,
}

impl MfgDate {
    pub fn from_minutes(minutes: u32) -> Self {
        let dt = EPOCH + TimeDelta::minutes(i64::from(minutes));
        Self {
            minutes,
            formatted: dt.format(DATE_FORMAT).to_string(),
        }
    }

    /// Seconds are dropped from the minute count, but kept in the formatted
    /// string until the date is written out and read back.
    pub fn from_datetime(dt: NaiveDateTime) -> Result<Self, DateError> {
        // Whole minutes, rounded down; earlier than the epoch stays negative.
        let minutes = (dt - EPOCH).num_seconds().div_euclid(60);
        match u32::try_from(minutes) {
            Ok(m) if m <= MAX_MINUTES => Ok(Self {
                minutes: m,
                formatted: dt.format(DATE_FORMAT).to_string(),
            }),
            _ => Err(DateError::OutOfRange(dt.format(DATE_FORMAT).to_string())),
        }
    }

    pub fn parse(input: &str) -> Result<Self, DateError> {
        match NaiveDateTime::parse_from_str(input.trim(), DATE_FORMAT) {
            Ok(dt) => Self::from_datetime(dt),
            Err(source) => Err(DateError::Format {
                input: input.to_string(),
                source,
            }),
        }
    }

    pub fn from_bytes(b: [u8; 3]) -> Self {
        Self::from_minutes(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        let [b0, b1, b2, _] = self.minutes.to_le_bytes();
        [b0, b1, b2]
    }
}

impl Default for MfgDate {
    fn default() -> Self {
        Self::from_minutes(0)
    }
}

impl Display for MfgDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted)
    }
}

#[test]
fn epoch_is_zero() {
    let d = MfgDate::parse("1996-01-01 00:00:00").unwrap();
    assert_eq!(d.minutes, 0);
    assert_eq!(d.to_bytes(), [0, 0, 0]);
    assert_eq!(MfgDate::default(), d);
}

#[test]
fn known_date() {
    // 2024-01-01 is 10227 days after the epoch.
    let d = MfgDate::parse("2024-01-01 12:30:00").unwrap();
    assert_eq!(d.minutes, 10227 * 24 * 60 + 12 * 60 + 30);
    let b = d.to_bytes();
    let back = MfgDate::from_bytes(b);
    assert_eq!(back.minutes, d.minutes);
    assert_eq!(back.formatted, "2024-01-01 12:30:00");
}

#[test]
fn round_trip_through_bytes() {
    for m in [0, 1, 59, 60, 1440, 0x00_1234, 0x12_3456, MAX_MINUTES] {
        let d = MfgDate::from_minutes(m);
        let again = MfgDate::parse(&d.formatted).unwrap();
        assert_eq!(again, d);
        assert_eq!(MfgDate::from_bytes(d.to_bytes()), d);
    }
}

#[test]
fn seconds_are_truncated() {
    let d = MfgDate::parse("1996-01-01 00:01:59").unwrap();
    assert_eq!(d.minutes, 1);
    assert_eq!(d.formatted, "1996-01-01 00:01:59");
    assert_eq!(MfgDate::from_bytes(d.to_bytes()).formatted, "1996-01-01 00:01:00");
}

#[test]
fn out_of_range() {
    assert!(matches!(
        MfgDate::parse("1995-12-31 23:59:00"),
        Err(DateError::OutOfRange(_))
    ));
    assert!(matches!(
        MfgDate::parse("1995-12-31 23:59:30"),
        Err(DateError::OutOfRange(_))
    ));
    let last = MfgDate::from_minutes(MAX_MINUTES);
    let dt = NaiveDateTime::parse_from_str(&last.formatted, DATE_FORMAT).unwrap();
    assert!(MfgDate::from_datetime(dt + TimeDelta::minutes(1)).is_err());
}

#[test]
fn bad_format() {
    assert!(matches!(
        MfgDate::parse("2024/01/01"),
        Err(DateError::Format { .. })
    ));
}
