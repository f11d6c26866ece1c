//! The timetable state engine.
//!
//! A [`TimetableEngine`] is constructed once by the host from a provider and
//! passed by reference to whatever displays need it. All queries take the
//! query time as an argument; the engine never reads the system clock.

pub mod board;
pub mod journey;
pub mod overlay;
pub mod position;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::identifiers::*;
use crate::models::{schedule::Trip, traits::TimetableProvider, types::*};

use overlay::{TripOverlay, TripUpdate};
use state::{compute_trip_state, TripState};

/// Display rules for boards and trackers
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BoardPolicy {
    /// From this hour onwards boards show the next morning's services
    pub rollover_start_hour: u8,
    /// Before this hour boards show the morning's services
    pub rollover_end_hour: u8,
    /// Time boards report from while rolled over
    pub rollover_time: ClockTime,
    pub default_limit: usize,
    /// How far ahead a scheduled trip counts as an upcoming departure
    pub upcoming_window_minutes: u16,
}

impl Default for BoardPolicy {
    fn default() -> Self {
        Self {
            rollover_start_hour: 20,
            rollover_end_hour: 10,
            rollover_time: ClockTime::at(9, 0),
            default_limit: 10,
            upcoming_window_minutes: 30,
        }
    }
}

impl BoardPolicy {
    /// Time a departure board actually reports from.
    ///
    /// Outside operating hours the board pre-shows the next morning by
    /// reporting from the rollover time instead of the real query time.
    pub fn effective_time(&self, query: ClockTime) -> ClockTime {
        let hour = query.hour();
        if hour >= self.rollover_start_hour || hour < self.rollover_end_hour {
            self.rollover_time
        } else {
            query
        }
    }
}

/// Pure derivations of live train state over a static timetable
#[derive(Clone)]
pub struct TimetableEngine {
    provider: Arc<dyn TimetableProvider>,
    overlays: HashMap<TripCode, TripOverlay>,
    policy: BoardPolicy,
}

impl TimetableEngine {
    pub fn new(provider: Arc<dyn TimetableProvider>) -> Self {
        Self::with_policy(provider, BoardPolicy::default())
    }

    pub fn with_policy(provider: Arc<dyn TimetableProvider>, policy: BoardPolicy) -> Self {
        Self {
            provider,
            overlays: HashMap::new(),
            policy,
        }
    }

    pub fn provider(&self) -> &dyn TimetableProvider {
        self.provider.as_ref()
    }

    pub fn policy(&self) -> &BoardPolicy {
        &self.policy
    }

    pub fn overlay(&self, trip: &TripCode) -> Option<&TripOverlay> {
        self.overlays.get(trip)
    }

    // ---- Status overlay ----

    /// Record a status change for a trip.
    ///
    /// Stop-level updates must name a station the trip calls at, and the
    /// terminal stops of a trip cannot be skipped.
    pub fn apply_update(&mut self, trip_code: &TripCode, update: TripUpdate, at: ClockTime) -> Result<()> {
        let trip = self
            .provider
            .get_trip(trip_code)
            .ok_or_else(|| TimetableError::TripNotFound(trip_code.clone()))?;

        match &update {
            TripUpdate::PlatformChange { station, .. } => {
                if trip.stop_index(station).is_none() {
                    return Err(TimetableError::StationNotFound(station.clone()));
                }
            }
            TripUpdate::SkipStop { station } => match trip.stop_index(station) {
                None => return Err(TimetableError::StationNotFound(station.clone())),
                Some(i) if i == 0 || i + 1 == trip.stops.len() => {
                    return Err(TimetableError::InvalidData(format!(
                        "cannot skip terminal stop {station} of trip {trip_code}"
                    )));
                }
                Some(_) => {}
            },
            _ => {}
        }

        tracing::debug!("trip {trip_code}: applying {update:?} at {at}");
        self.overlays.entry(trip_code.clone()).or_default().apply(update, at);
        Ok(())
    }

    // ---- Trip state ----

    pub fn compute_trip_state(&self, trip: &Trip, query: ClockTime) -> TripState {
        compute_trip_state(trip, self.overlays.get(&trip.code), query)
    }

    /// `None` if no trip has this code
    pub fn trip_state(&self, trip_code: &TripCode, query: ClockTime) -> Option<TripState> {
        let trip = self.provider.get_trip(trip_code)?;
        Some(self.compute_trip_state(&trip, query))
    }

    pub fn trip_status(&self, trip: &Trip, query: ClockTime) -> TripStatus {
        let overlay = self.overlays.get(&trip.code);
        TripStatus {
            state: compute_trip_state(trip, overlay, query).lifecycle,
            delay_minutes: overlay.map_or(0, |o| o.delay_minutes),
            message: overlay.and_then(|o| o.message.clone()),
            last_updated: query,
        }
    }

    /// Trips that are running or yet to start
    pub fn active_trips(&self, query: ClockTime) -> Vec<(Arc<Trip>, TripState)> {
        self.provider
            .trips()
            .iter()
            .map(|trip| (trip.clone(), self.compute_trip_state(trip, query)))
            .filter(|(_, state)| state.is_active())
            .collect()
    }

    /// Trips leaving their origin within the upcoming window.
    ///
    /// A trip that has already run today counts with tomorrow's departure, so
    /// late in the evening the early morning services show up.
    pub fn upcoming_departures(&self, query: ClockTime) -> Vec<Arc<Trip>> {
        let window = self.policy.upcoming_window_minutes as i32;
        self.provider
            .trips()
            .iter()
            .filter(|trip| {
                matches!(
                    self.compute_trip_state(trip, query).lifecycle,
                    TripLifecycle::Scheduled | TripLifecycle::Completed
                )
            })
            .filter(|trip| {
                let Some(first_departure) = trip.first_departure() else {
                    return false;
                };
                let mut wait = query.minutes_until(first_departure);
                if wait < 0 {
                    wait += 24 * 60;
                }
                wait > 0 && wait <= window
            })
            .cloned()
            .collect()
    }

    /// Trips whose calendar includes `date`
    pub fn trips_running_on(&self, date: NaiveDate) -> Vec<Arc<Trip>> {
        self.provider
            .trips()
            .iter()
            .filter(|trip| trip.runs_on(date))
            .cloned()
            .collect()
    }
}
