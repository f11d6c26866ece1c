//! Core data types and enums for timetable data.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};

use crate::identifiers::*;

// ============================================================================
// Clock time
// ============================================================================

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A time of day on the operating line, at minute granularity.
///
/// Stored as minutes since midnight. There is no timezone and no date: every
/// timetable is assumed to run within one day, so arithmetic never wraps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self(hour as u16 * 60 + minute as u16))
    }

    /// For literal times; panics on an out-of-range hour or minute
    pub const fn at(hour: u8, minute: u8) -> Self {
        assert!(hour < 24 && minute < 60, "clock time out of range");
        Self(hour as u16 * 60 + minute as u16)
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn hour(self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(self) -> u8 {
        (self.0 % 60) as u8
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.0
    }

    /// Signed number of minutes from `self` until `later`, same-day arithmetic.
    pub fn minutes_until(self, later: ClockTime) -> i32 {
        later.0 as i32 - self.0 as i32
    }

    /// Returns `None` if the result leaves the day.
    pub fn checked_add_minutes(self, minutes: i32) -> Option<Self> {
        let total = self.0 as i32 + minutes;
        if (0..MINUTES_PER_DAY as i32).contains(&total) {
            Some(Self(total as u16))
        } else {
            None
        }
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        Self(time.hour() as u16 * 60 + time.minute() as u16)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = TimetableError;

    /// Parses `"HH:MM"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TimetableError::InvalidTime(s.to_owned());

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
            return Err(invalid());
        }
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;

        ClockTime::new(hour, minute).ok_or_else(invalid)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ClockTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ClockTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Traction used for a service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ServiceClass {
    Steam,
    Diesel,
    #[strum(to_string = "MultipleUnit", serialize = "DMU")]
    #[cfg_attr(feature = "serde", serde(alias = "DMU"))]
    MultipleUnit,
}

/// Direction of travel relative to the milepost ordering of the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Towards higher mileposts (the canonical direction)
    Outbound = 0,
    /// Towards lower mileposts
    Inbound = 1,
}

/// Role of a stop within its trip, derived from which times it carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopType {
    Origin,
    Intermediate,
    Destination,
}

/// Lifecycle of a whole trip at a query time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum TripLifecycle {
    Scheduled,
    Running,
    Completed,
    Cancelled,
}

/// Lifecycle tag of a single stop at a query time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum StopStatus {
    Scheduled,
    Arrived,
    Departed,
    Skipped,
    Cancelled,
}

// ============================================================================
// Data Structures
// ============================================================================

/// Where a running train is, derived from its schedule and the query time.
///
/// This is never stored: it is recomputed on every query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TripLocation {
    At(StationCode),
    Between(StationCode, StationCode),
}

impl TripLocation {
    /// The station the train is at, or has most recently left
    pub fn last_station(&self) -> &StationCode {
        match self {
            TripLocation::At(station) => station,
            TripLocation::Between(from, _) => from,
        }
    }
}

impl fmt::Display for TripLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripLocation::At(station) => write!(f, "at {station}"),
            TripLocation::Between(from, to) => write!(f, "between {from} and {to}"),
        }
    }
}

/// Live status of a trip as reported to displays
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripStatus {
    pub state: TripLifecycle,
    /// Positive is late, negative is early
    pub delay_minutes: i32,
    pub message: Option<String>,
    pub last_updated: ClockTime,
}

impl TripStatus {
    /// Board wording for a delay
    pub fn delay_text(delay_minutes: i32) -> String {
        match delay_minutes {
            0 => "On Time".to_owned(),
            d if d > 0 => format!("Exp {d} min late"),
            _ => "Running early".to_owned(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    #[error("Station not found: {0}")]
    StationNotFound(StationCode),

    #[error("Trip not found: {0}")]
    TripNotFound(TripCode),

    #[error("Invalid clock time: {0:?} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Malformed schedule for trip {trip}: {reason}")]
    MalformedSchedule { trip: TripCode, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Dataset error: {0}")]
    Dataset(String),
}

pub type Result<T> = std::result::Result<T, TimetableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_time_parse_and_display() {
        let t: ClockTime = "09:05".parse().unwrap();
        assert_eq!(t.hour(), 9);
        assert_eq!(t.minute(), 5);
        assert_eq!(t.to_string(), "09:05");

        let t: ClockTime = "9:05".parse().unwrap();
        assert_eq!(t.to_string(), "09:05");

        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("10:60".parse::<ClockTime>().is_err());
        assert!("1015".parse::<ClockTime>().is_err());
        assert!("10:5".parse::<ClockTime>().is_err());
    }

    #[test]
    fn test_clock_time_ordering_matches_text() {
        let a: ClockTime = "09:59".parse().unwrap();
        let b: ClockTime = "10:00".parse().unwrap();
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn test_clock_time_arithmetic() {
        let dep: ClockTime = "10:15".parse().unwrap();
        let arr: ClockTime = "11:35".parse().unwrap();
        assert_eq!(dep.minutes_until(arr), 80);
        assert_eq!(arr.minutes_until(dep), -80);

        assert_eq!(arr.checked_add_minutes(1).unwrap().to_string(), "11:36");
        assert!(ClockTime::new(23, 59).unwrap().checked_add_minutes(1).is_none());
        assert!(ClockTime::MIDNIGHT.checked_add_minutes(-1).is_none());
    }

    #[test]
    fn test_clock_time_from_naive_time() {
        let time = NaiveTime::from_hms_opt(20, 5, 59).unwrap();
        assert_eq!(ClockTime::from(time).to_string(), "20:05");
    }

    #[test]
    fn test_service_class_parse() {
        assert_eq!("Steam".parse::<ServiceClass>().unwrap(), ServiceClass::Steam);
        assert_eq!("DMU".parse::<ServiceClass>().unwrap(), ServiceClass::MultipleUnit);
        assert_eq!(ServiceClass::MultipleUnit.to_string(), "MultipleUnit");
        assert!("Electric".parse::<ServiceClass>().is_err());
    }

    #[test]
    fn test_delay_text() {
        assert_eq!(TripStatus::delay_text(0), "On Time");
        assert_eq!(TripStatus::delay_text(7), "Exp 7 min late");
        assert_eq!(TripStatus::delay_text(-2), "Running early");
    }

    #[test]
    fn test_location_display() {
        let loc = TripLocation::Between(StationCode::new("BL"), StationCode::new("CH"));
        assert_eq!(loc.to_string(), "between BL and CH");
        assert_eq!(loc.last_station().as_str(), "BL");
    }
}
