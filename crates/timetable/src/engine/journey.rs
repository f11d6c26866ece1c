//! Direct journey search.
//!
//! Only trips that call at both stations are considered; there is no
//! interchange planning.

use crate::engine::TimetableEngine;
use crate::identifiers::*;
use crate::models::types::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JourneySegment {
    pub trip: TripCode,
    pub service_id: ServiceIdentifier,
    pub from: StationCode,
    pub to: StationCode,
    pub departure: ClockTime,
    pub arrival: ClockTime,
    pub service_class: ServiceClass,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Journey {
    pub segments: Vec<JourneySegment>,
    pub departure: ClockTime,
    pub arrival: ClockTime,
    pub duration_minutes: i32,
    pub changes: u32,
}

impl TimetableEngine {
    /// Single-trip journeys from `from` to `to` leaving at or after `depart_after`.
    ///
    /// Sorted by departure and cut to `limit`. Cancelled trips and trips
    /// skipping either end are left out.
    pub fn find_direct_journeys(
        &self,
        from: &StationCode,
        to: &StationCode,
        depart_after: ClockTime,
        limit: usize,
    ) -> Vec<Journey> {
        let mut journeys: Vec<Journey> = self
            .provider
            .trips()
            .iter()
            .filter_map(|trip| {
                let overlay = self.overlay(&trip.code);
                if overlay.is_some_and(|o| o.cancelled || o.is_skipped(from) || o.is_skipped(to)) {
                    return None;
                }

                let from_index = trip.stop_index(from)?;
                let to_index = trip.stop_index(to)?;
                if from_index >= to_index {
                    return None;
                }

                let departure = trip.stops[from_index].departure.filter(|&d| d >= depart_after)?;
                let arrival = trip.stops[to_index].arrival?;

                Some(Journey {
                    segments: vec![JourneySegment {
                        trip: trip.code.clone(),
                        service_id: trip.service_id.clone(),
                        from: from.clone(),
                        to: to.clone(),
                        departure,
                        arrival,
                        service_class: trip.service_class,
                    }],
                    departure,
                    arrival,
                    duration_minutes: departure.minutes_until(arrival),
                    changes: 0,
                })
            })
            .collect();

        journeys.sort_by_key(|journey| journey.departure);
        journeys.truncate(limit);
        journeys
    }
}
