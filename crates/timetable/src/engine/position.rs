//! Where a train is along the line: progress bars, map markers and next-stop
//! countdowns.

use std::fmt;

use geo::{LineString, Point};

use crate::engine::state::{leg_end, TripState};
use crate::engine::TimetableEngine;
use crate::identifiers::StationCode;
use crate::models::{schedule::Trip, types::*};
use crate::spatial::queries::{haversine_distance, interpolate};

/// The next call of a trip and how long until it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NextStop {
    pub station: StationCode,
    pub arrival: ClockTime,
    pub minutes: i32,
}

impl fmt::Display for NextStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minutes {
            m if m < 1 => write!(f, "Arriving now"),
            1 => write!(f, "1 minute"),
            m => write!(f, "{m} minutes"),
        }
    }
}

/// Wait until a trip leaves its origin
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepartureCountdown {
    pub station: StationCode,
    pub departure: ClockTime,
    pub minutes: i32,
}

impl fmt::Display for DepartureCountdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minutes {
            m if m < 1 => write!(f, "Departing now"),
            1 => write!(f, "1 minute"),
            m => write!(f, "{m} minutes"),
        }
    }
}

/// How far a trip is through its own calls
#[derive(Clone, Debug, PartialEq)]
pub struct TripProgress {
    /// Share of stops already departed, 0 to 100
    pub percentage: f64,
    pub last_departed: Option<StationCode>,
    pub next: Option<StationCode>,
}

impl TimetableEngine {
    /// Position of a trip along the whole line as a percentage.
    ///
    /// Measured from the lowest milepost whatever the direction of travel.
    /// A trip that has not started (or is cancelled) sits at its origin and a
    /// completed one at its destination. A trip with no stops sits at 0.
    pub fn compute_line_position(&self, trip: &Trip, query: ClockTime) -> f64 {
        let state = self.compute_trip_state(trip, query);
        self.line_position(trip, &state)
    }

    pub fn line_position(&self, trip: &Trip, state: &TripState) -> f64 {
        let last = self.provider.stations().len().saturating_sub(1);
        if last == 0 {
            return 0.0;
        }
        let index = |code: &StationCode| self.provider.line_index(code).unwrap_or(0) as f64;

        let position = match (&state.location, state.lifecycle) {
            (Some(TripLocation::At(station)), _) => index(station),
            (Some(TripLocation::Between(from, to)), _) => (index(from) + index(to)) / 2.0,
            (None, lifecycle) => {
                let terminal = match lifecycle {
                    TripLifecycle::Completed => trip.destination(),
                    _ => trip.origin(),
                };
                match terminal {
                    Some(code) => index(code),
                    None => return 0.0,
                }
            }
        };

        (position / last as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Map coordinate of a running train.
    ///
    /// Between stations the point is placed by the share of the scheduled run
    /// already elapsed. `None` when the train is not on the line.
    pub fn train_coordinate(&self, trip: &Trip, query: ClockTime) -> Option<Point> {
        let state = self.compute_trip_state(trip, query);
        match state.location? {
            TripLocation::At(station) => Some(self.provider.get_station(&station)?.location),
            TripLocation::Between(from, to) => {
                let i = trip.stop_index(&from)?;
                let start = trip.stops[i].departure?;
                let end = leg_end(trip, self.overlay(&trip.code), i)?;
                let run = start.minutes_until(end);
                let fraction = if run > 0 {
                    start.minutes_until(query) as f64 / run as f64
                } else {
                    0.0
                };

                let from = self.provider.get_station(&from)?;
                let to = self.provider.get_station(&to)?;
                Some(interpolate(from.location, to.location, fraction))
            }
        }
    }

    /// First call whose scheduled arrival is still ahead of `query`
    pub fn time_to_next_stop(&self, trip: &Trip, query: ClockTime) -> Option<NextStop> {
        let overlay = self.overlay(&trip.code);
        if overlay.is_some_and(|o| o.cancelled) {
            return None;
        }

        trip.stops
            .iter()
            .filter(|stop| !overlay.is_some_and(|o| o.is_skipped(&stop.station)))
            .find_map(|stop| {
                let arrival = stop.arrival.filter(|&arrival| arrival > query)?;
                Some(NextStop {
                    station: stop.station.clone(),
                    arrival,
                    minutes: query.minutes_until(arrival),
                })
            })
    }

    /// Minutes until `trip` leaves its origin, wrapping past midnight like
    /// [`upcoming_departures`](TimetableEngine::upcoming_departures).
    ///
    /// `None` for a cancelled trip.
    pub fn time_to_departure(&self, trip: &Trip, query: ClockTime) -> Option<DepartureCountdown> {
        if self.overlay(&trip.code).is_some_and(|o| o.cancelled) {
            return None;
        }
        let departure = trip.first_departure()?;
        let mut minutes = query.minutes_until(departure);
        if minutes < 0 {
            minutes += 24 * 60;
        }
        Some(DepartureCountdown {
            station: trip.origin()?.clone(),
            departure,
            minutes,
        })
    }

    /// Progress through the stops the trip actually calls at, for the journey tracker.
    ///
    /// Skipped stops are left out and a cancelled trip makes no progress.
    pub fn trip_progress(&self, trip: &Trip, query: ClockTime) -> TripProgress {
        let overlay = self.overlay(&trip.code);
        let mut passed = 0;
        let mut last_departed = None;
        let mut next = None;

        if overlay.is_some_and(|o| o.cancelled) {
            return TripProgress {
                percentage: 0.0,
                last_departed,
                next,
            };
        }

        let calls: Vec<_> = trip
            .stops
            .iter()
            .filter(|stop| !overlay.is_some_and(|o| o.is_skipped(&stop.station)))
            .collect();

        for (i, stop) in calls.iter().enumerate() {
            if stop.departure.is_some_and(|departure| query >= departure) {
                passed = i + 1;
                last_departed = Some(stop.station.clone());
            } else if stop.arrival.is_some_and(|arrival| query < arrival) {
                next = Some(stop.station.clone());
                break;
            }
        }

        let percentage = if calls.is_empty() {
            0.0
        } else {
            passed as f64 / calls.len() as f64 * 100.0
        };

        TripProgress {
            percentage,
            last_departed,
            next,
        }
    }

    /// The track drawn through every station in line order
    pub fn line_geometry(&self) -> LineString {
        self.provider
            .stations()
            .iter()
            .map(|station| station.location)
            .collect()
    }

    /// Straight-line length in meters of each section between adjacent stations
    pub fn section_lengths(&self) -> Vec<f64> {
        self.provider
            .stations()
            .windows(2)
            .map(|pair| haversine_distance(pair[0].location, pair[1].location))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::overlay::TripUpdate;
    use crate::identifiers::TripCode;
    use crate::sample;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn engine() -> TimetableEngine {
        TimetableEngine::new(Arc::new(sample::west_somerset().unwrap()))
    }

    fn trip(engine: &TimetableEngine, code: &str) -> Arc<Trip> {
        engine.provider().get_trip(&TripCode::new(code)).unwrap()
    }

    #[test]
    fn test_line_position_between_and_terminals() {
        let engine = engine();
        let northbound = trip(&engine, "1S01");

        // BL is index 0 and CH index 1 of 10 stations
        assert_relative_eq!(engine.compute_line_position(&northbound, t("10:20")), 0.5 / 9.0 * 100.0);
        assert_relative_eq!(engine.compute_line_position(&northbound, t("09:00")), 0.0);
        assert_relative_eq!(engine.compute_line_position(&northbound, t("12:00")), 100.0);

        // Southbound trips are measured from the same end
        let southbound = trip(&engine, "1D05");
        assert_relative_eq!(engine.compute_line_position(&southbound, t("09:00")), 100.0);
        assert_relative_eq!(engine.compute_line_position(&southbound, t("10:05")), 8.5 / 9.0 * 100.0);
    }

    #[test]
    fn test_line_position_monotonic_outbound() {
        let engine = engine();
        for trip in engine.provider().trips() {
            if engine.provider().direction(trip) != Direction::Outbound {
                continue;
            }
            let mut previous = 0.0;
            let mut query = ClockTime::MIDNIGHT;
            while let Some(next) = query.checked_add_minutes(1) {
                let position = engine.compute_line_position(trip, query);
                assert!(position >= previous, "{} went backwards at {query}", trip.code);
                previous = position;
                query = next;
            }
        }
    }

    #[test]
    fn test_train_coordinate() {
        let engine = engine();
        let northbound = trip(&engine, "1S01");
        let bl = engine.provider().get_station(&"BL".into()).unwrap();
        let ch = engine.provider().get_station(&"CH".into()).unwrap();

        assert!(engine.train_coordinate(&northbound, t("09:00")).is_none());

        let start = engine.train_coordinate(&northbound, t("10:15")).unwrap();
        assert_relative_eq!(start.x(), bl.location.x());
        assert_relative_eq!(start.y(), bl.location.y());

        // 10:15 -> 10:28 is a 13 minute run
        let partway = engine.train_coordinate(&northbound, t("10:20")).unwrap();
        let expected = bl.location.y() + (ch.location.y() - bl.location.y()) * 5.0 / 13.0;
        assert_relative_eq!(partway.y(), expected, epsilon = 1e-9);

        let arrived = engine.train_coordinate(&northbound, t("11:35")).unwrap();
        let min = engine.provider().get_station(&"MIN".into()).unwrap();
        assert_relative_eq!(arrived.x(), min.location.x());
    }

    #[test]
    fn test_time_to_next_stop() {
        let mut engine = engine();
        let northbound = trip(&engine, "1S01");

        let next = engine.time_to_next_stop(&northbound, t("10:20")).unwrap();
        assert_eq!(next.station.as_str(), "CH");
        assert_eq!(next.minutes, 8);
        assert_eq!(next.to_string(), "8 minutes");

        let next = engine.time_to_next_stop(&northbound, t("10:27")).unwrap();
        assert_eq!(next.to_string(), "1 minute");

        assert!(engine.time_to_next_stop(&northbound, t("11:35")).is_none());

        engine
            .apply_update(&northbound.code, TripUpdate::SkipStop { station: "CH".into() }, t("10:00"))
            .unwrap();
        let next = engine.time_to_next_stop(&northbound, t("10:20")).unwrap();
        assert_eq!(next.station.as_str(), "STO");

        let arriving = NextStop {
            station: "CH".into(),
            arrival: t("10:28"),
            minutes: 0,
        };
        assert_eq!(arriving.to_string(), "Arriving now");
    }

    #[test]
    fn test_trip_progress() {
        let engine = engine();
        let northbound = trip(&engine, "1S01");

        let before = engine.trip_progress(&northbound, t("10:00"));
        assert_relative_eq!(before.percentage, 0.0);
        assert_eq!(before.next.as_ref().map(|s| s.as_str()), Some("CH"));

        let progress = engine.trip_progress(&northbound, t("10:40"));
        // BL, CH and STO departed out of 10 stops
        assert_relative_eq!(progress.percentage, 30.0);
        assert_eq!(progress.last_departed.as_ref().map(|s| s.as_str()), Some("STO"));
        assert_eq!(progress.next.as_ref().map(|s| s.as_str()), Some("WIL"));
    }

    #[test]
    fn test_empty_trip_does_not_panic() {
        let engine = engine();
        let empty = Trip::new("9Z99", "svc", ServiceClass::Steam, vec![]);

        assert_eq!(engine.compute_trip_state(&empty, t("10:00")).lifecycle, TripLifecycle::Scheduled);
        assert_relative_eq!(engine.compute_line_position(&empty, t("10:00")), 0.0);
        assert_eq!(engine.provider().direction(&empty), Direction::Outbound);
        assert!(engine.time_to_departure(&empty, t("10:00")).is_none());
        assert_relative_eq!(engine.trip_progress(&empty, t("10:00")).percentage, 0.0);
    }

    #[test]
    fn test_trip_progress_with_overlay() {
        let mut engine = engine();
        let northbound = trip(&engine, "1S01");
        engine
            .apply_update(&northbound.code, TripUpdate::SkipStop { station: "CH".into() }, t("10:00"))
            .unwrap();

        let progress = engine.trip_progress(&northbound, t("10:20"));
        assert_eq!(progress.next.as_ref().map(|s| s.as_str()), Some("STO"));

        // BL and STO departed out of the 9 calls left
        let progress = engine.trip_progress(&northbound, t("10:40"));
        assert_relative_eq!(progress.percentage, 2.0 / 9.0 * 100.0);
        assert_eq!(progress.last_departed.as_ref().map(|s| s.as_str()), Some("STO"));

        engine
            .apply_update(&northbound.code, TripUpdate::Cancellation { reason: None }, t("10:00"))
            .unwrap();
        let cancelled = engine.trip_progress(&northbound, t("10:40"));
        assert_relative_eq!(cancelled.percentage, 0.0);
        assert!(cancelled.last_departed.is_none());
        assert!(cancelled.next.is_none());
    }

    #[test]
    fn test_time_to_departure() {
        let mut engine = engine();
        let northbound = trip(&engine, "1S01");

        let countdown = engine.time_to_departure(&northbound, t("09:50")).unwrap();
        assert_eq!(countdown.station.as_str(), "BL");
        assert_eq!(countdown.departure, t("10:15"));
        assert_eq!(countdown.to_string(), "25 minutes");

        assert_eq!(engine.time_to_departure(&northbound, t("10:14")).unwrap().to_string(), "1 minute");
        assert_eq!(engine.time_to_departure(&northbound, t("10:15")).unwrap().to_string(), "Departing now");

        // Tomorrow's run once today's has gone
        assert_eq!(engine.time_to_departure(&northbound, t("23:45")).unwrap().minutes, 10 * 60 + 30);

        engine
            .apply_update(&northbound.code, TripUpdate::Cancellation { reason: None }, t("09:00"))
            .unwrap();
        assert!(engine.time_to_departure(&northbound, t("09:50")).is_none());
    }

    #[test]
    fn test_line_geometry() {
        let engine = engine();
        let line = engine.line_geometry();
        assert_eq!(line.0.len(), 10);

        let sections = engine.section_lengths();
        assert_eq!(sections.len(), 9);
        assert!(sections.iter().all(|&m| m > 0.0));
    }
}
