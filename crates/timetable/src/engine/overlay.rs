//! Live status layered over the static schedule.
//!
//! The schedule itself is immutable. Delays, cancellations, platform changes
//! and skipped stops are kept per trip in a [`TripOverlay`] and consulted by
//! the derivations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::identifiers::StationCode;
use crate::models::types::ClockTime;

/// A status change reported for one trip
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TripUpdate {
    /// Positive minutes is late, negative is early
    Delay { minutes: i32, message: Option<String> },
    Cancellation { reason: Option<String> },
    PlatformChange { station: StationCode, platform: Arc<str> },
    /// The train will run through this station without calling
    SkipStop { station: StationCode },
    /// Drop every override and return to the plain schedule
    Reinstate,
}

/// Accumulated overrides for a trip
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TripOverlay {
    pub delay_minutes: i32,
    pub message: Option<String>,
    pub cancelled: bool,
    pub skipped: HashSet<StationCode>,
    pub platforms: HashMap<StationCode, Arc<str>>,
    pub updated_at: Option<ClockTime>,
}

impl TripOverlay {
    pub fn apply(&mut self, update: TripUpdate, at: ClockTime) {
        match update {
            TripUpdate::Delay { minutes, message } => {
                self.delay_minutes = minutes;
                self.message = message;
            }
            TripUpdate::Cancellation { reason } => {
                self.cancelled = true;
                self.message = reason;
            }
            TripUpdate::PlatformChange { station, platform } => {
                self.platforms.insert(station, platform);
            }
            TripUpdate::SkipStop { station } => {
                self.skipped.insert(station);
            }
            TripUpdate::Reinstate => *self = TripOverlay::default(),
        }
        self.updated_at = Some(at);
    }

    pub fn is_skipped(&self, station: &StationCode) -> bool {
        self.skipped.contains(station)
    }

    pub fn platform(&self, station: &StationCode) -> Option<&Arc<str>> {
        self.platforms.get(station)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_accumulate() {
        let at: ClockTime = "10:30".parse().unwrap();
        let mut overlay = TripOverlay::default();

        overlay.apply(
            TripUpdate::Delay {
                minutes: 5,
                message: Some("Running 5 minutes late".into()),
            },
            at,
        );
        overlay.apply(
            TripUpdate::PlatformChange {
                station: StationCode::new("MIN"),
                platform: "2".into(),
            },
            at,
        );
        overlay.apply(TripUpdate::SkipStop { station: StationCode::new("DON") }, at);

        assert_eq!(overlay.delay_minutes, 5);
        assert_eq!(overlay.platform(&StationCode::new("MIN")).map(|p| &**p), Some("2"));
        assert!(overlay.is_skipped(&StationCode::new("DON")));
        assert!(!overlay.cancelled);
        assert_eq!(overlay.updated_at, Some(at));
    }

    #[test]
    fn test_reinstate_clears() {
        let at: ClockTime = "10:30".parse().unwrap();
        let mut overlay = TripOverlay::default();
        overlay.apply(TripUpdate::Cancellation { reason: Some("Fire risk".into()) }, at);
        assert!(overlay.cancelled);
        assert_eq!(overlay.message.as_deref(), Some("Fire risk"));

        overlay.apply(TripUpdate::Reinstate, at);
        assert!(!overlay.cancelled);
        assert!(overlay.message.is_none());
    }
}
