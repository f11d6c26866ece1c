//! Station departure and arrival boards.

use std::sync::Arc;

use crate::engine::TimetableEngine;
use crate::identifiers::*;
use crate::models::types::*;

/// One line on a departure or arrival board
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardEntry {
    pub trip: TripCode,
    pub service_id: ServiceIdentifier,
    pub time: ClockTime,
    /// Destination name on departures, origin name on arrivals
    pub terminus: Arc<str>,
    pub platform: Option<Arc<str>>,
    pub service_class: ServiceClass,
    pub delay_minutes: i32,
    pub status: String,
    pub is_cancelled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepartureBoard {
    pub station: StationCode,
    /// The time the board reports from, after the rollover rule
    pub effective_time: ClockTime,
    pub departures: Vec<BoardEntry>,
    pub arrivals: Vec<BoardEntry>,
}

impl TimetableEngine {
    /// Build the board for `station` as of `query`.
    ///
    /// Each list holds calls at or after the effective time, sorted by time
    /// and cut to `limit`. An unknown station gives an empty board.
    pub fn derive_departure_board(&self, station: &StationCode, query: ClockTime, limit: usize) -> DepartureBoard {
        let effective_time = self.policy.effective_time(query);
        let mut departures = Vec::new();
        let mut arrivals = Vec::new();

        for trip in self.provider.trips() {
            let Some(stop) = trip.stop_at(station) else {
                continue;
            };
            let overlay = self.overlay(&trip.code);
            if overlay.is_some_and(|o| o.is_skipped(station)) {
                continue;
            }

            let is_cancelled = overlay.is_some_and(|o| o.cancelled);
            let delay_minutes = overlay.map_or(0, |o| o.delay_minutes);
            let status = if is_cancelled {
                "Cancelled".to_owned()
            } else {
                TripStatus::delay_text(delay_minutes)
            };
            let platform = overlay
                .and_then(|o| o.platform(station))
                .or(stop.platform.as_ref())
                .cloned();

            let entry = |time: ClockTime, terminus: Option<&StationCode>| BoardEntry {
                trip: trip.code.clone(),
                service_id: trip.service_id.clone(),
                time,
                terminus: terminus.map_or_else(|| Arc::from(""), |code| self.provider.station_name(code)),
                platform: platform.clone(),
                service_class: trip.service_class,
                delay_minutes,
                status: status.clone(),
                is_cancelled,
            };

            if let Some(departure) = stop.departure.filter(|&time| time >= effective_time) {
                departures.push(entry(departure, trip.destination()));
            }
            if let Some(arrival) = stop.arrival.filter(|&time| time >= effective_time) {
                arrivals.push(entry(arrival, trip.origin()));
            }
        }

        departures.sort_by_key(|entry| entry.time);
        arrivals.sort_by_key(|entry| entry.time);
        departures.truncate(limit);
        arrivals.truncate(limit);

        DepartureBoard {
            station: station.clone(),
            effective_time,
            departures,
            arrivals,
        }
    }
}
