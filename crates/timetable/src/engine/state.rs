//! Trip state derivation.
//!
//! Every interval is left-closed and right-open, so at any instant between
//! the first departure and the last arrival exactly one of them matches:
//!
//! ```text
//! [dep 0, arr 1)  between stop 0 and stop 1
//! [arr 1, dep 1)  at stop 1 (only when it has a dwell)
//! [dep 1, arr 2)  between stop 1 and stop 2
//! ...
//! ```
//!
//! A zero-dwell stop has an empty "at" interval, so at its exact time the
//! train is already between it and the next stop. At the exact final arrival
//! the train is at its destination.
//!
//! Results for schedules that go backwards in time are unspecified; the
//! provider refuses to load them.

use crate::engine::overlay::TripOverlay;
use crate::models::schedule::Trip;
use crate::models::types::*;

/// Derived state of one trip at a query time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripState {
    pub lifecycle: TripLifecycle,
    pub location: Option<TripLocation>,
    /// One tag per stop, in stop order
    pub stop_tags: Vec<StopStatus>,
    pub as_of: ClockTime,
}

impl TripState {
    fn uniform(lifecycle: TripLifecycle, tag: StopStatus, stop_count: usize, as_of: ClockTime) -> Self {
        Self {
            lifecycle,
            location: None,
            stop_tags: vec![tag; stop_count],
            as_of,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.lifecycle, TripLifecycle::Running | TripLifecycle::Scheduled)
    }
}

/// Index of the stop at which the run between `from` and the following stop ends.
///
/// A skipped stop is passed at its departure time rather than its arrival.
pub(crate) fn leg_end(trip: &Trip, overlay: Option<&TripOverlay>, from: usize) -> Option<ClockTime> {
    let next = trip.stops.get(from + 1)?;
    if overlay.is_some_and(|o| o.is_skipped(&next.station)) {
        next.departure.or(next.arrival)
    } else {
        next.arrival
    }
}

/// Compute lifecycle, location and per-stop tags for `trip` at `query`.
pub fn compute_trip_state(trip: &Trip, overlay: Option<&TripOverlay>, query: ClockTime) -> TripState {
    let stop_count = trip.stops.len();

    if overlay.is_some_and(|o| o.cancelled) {
        return TripState::uniform(TripLifecycle::Cancelled, StopStatus::Cancelled, stop_count, query);
    }

    let (Some(first_departure), Some(last_arrival)) = (trip.first_departure(), trip.last_arrival()) else {
        return TripState::uniform(TripLifecycle::Scheduled, StopStatus::Scheduled, stop_count, query);
    };

    let skipped = |i: usize| overlay.is_some_and(|o| o.is_skipped(&trip.stops[i].station));
    let finish = |mut state: TripState| {
        for (i, tag) in state.stop_tags.iter_mut().enumerate() {
            if skipped(i) {
                *tag = StopStatus::Skipped;
            }
        }
        state
    };

    if query < first_departure {
        return finish(TripState::uniform(TripLifecycle::Scheduled, StopStatus::Scheduled, stop_count, query));
    }
    if query > last_arrival {
        return finish(TripState::uniform(TripLifecycle::Completed, StopStatus::Departed, stop_count, query));
    }

    let mut state = TripState::uniform(TripLifecycle::Running, StopStatus::Scheduled, stop_count, query);
    for (i, stop) in trip.stops.iter().enumerate() {
        if let (Some(arrival), Some(departure)) = (stop.arrival, stop.departure) {
            if arrival < departure && !skipped(i) && query >= arrival && query < departure {
                state.location = Some(TripLocation::At(stop.station.clone()));
                state.stop_tags[i] = StopStatus::Arrived;
                return finish(state);
            }
        }

        if let (Some(departure), Some(end)) = (stop.departure, leg_end(trip, overlay, i)) {
            if query >= departure && query < end {
                state.location = Some(TripLocation::Between(
                    stop.station.clone(),
                    trip.stops[i + 1].station.clone(),
                ));
                state.stop_tags[i] = StopStatus::Departed;
                return finish(state);
            }
        }

        if i + 1 < stop_count {
            state.stop_tags[i] = StopStatus::Departed;
        }
    }

    // Only the exact final arrival minute reaches here
    state.location = trip.destination().cloned().map(TripLocation::At);
    if let Some(tag) = state.stop_tags.last_mut() {
        *tag = StopStatus::Arrived;
    }
    finish(state)
}
