//! Load-time schedule checks.
//!
//! Malformed trips are rejected here so the engine never sees them. Nothing
//! is repaired: a trip either passes unchanged or the load fails.

use std::collections::HashMap;
use std::sync::Arc;

use crate::identifiers::StationCode;
use crate::models::schedule::{Station, Trip};
use crate::models::types::*;

fn malformed(trip: &Trip, reason: impl Into<String>) -> TimetableError {
    TimetableError::MalformedSchedule {
        trip: trip.code.clone(),
        reason: reason.into(),
    }
}

/// Check one trip against the station list
pub fn validate_trip(trip: &Trip, stations: &HashMap<StationCode, Arc<Station>>) -> Result<()> {
    let stops = &trip.stops;
    if stops.len() < 2 {
        return Err(malformed(trip, format!("needs at least 2 stops, has {}", stops.len())));
    }

    let last = stops.len() - 1;
    for (i, stop) in stops.iter().enumerate() {
        if !stations.contains_key(&stop.station) {
            return Err(malformed(trip, format!("stop {i} references unknown station {}", stop.station)));
        }

        match (i, stop.arrival, stop.departure) {
            (0, Some(_), _) => return Err(malformed(trip, "first stop has an arrival time")),
            (0, _, None) => return Err(malformed(trip, "first stop has no departure time")),
            (i, _, Some(_)) if i == last => return Err(malformed(trip, "last stop has a departure time")),
            (i, None, _) if i == last => return Err(malformed(trip, "last stop has no arrival time")),
            (i, arrival, departure) if i != 0 && i != last && (arrival.is_none() || departure.is_none()) => {
                return Err(malformed(trip, format!("intermediate stop {} is missing a time", stop.station)));
            }
            _ => {}
        }

        if let (Some(arrival), Some(departure)) = (stop.arrival, stop.departure) {
            if departure < arrival {
                return Err(malformed(
                    trip,
                    format!("departs {} from {} before arriving at {arrival}", departure, stop.station),
                ));
            }
        }
    }

    for pair in stops.windows(2) {
        let (Some(departure), Some(arrival)) = (pair[0].departure, pair[1].arrival) else {
            continue;
        };
        if arrival < departure {
            return Err(malformed(
                trip,
                format!(
                    "arrives at {} ({arrival}) before leaving {} ({departure})",
                    pair[1].station, pair[0].station
                ),
            ));
        }
    }

    Ok(())
}
