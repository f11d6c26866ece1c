//! # wsr-timetable
//!
//! Live train state derived from a static heritage-railway timetable.
//!
//! ## Features
//!
//! - **Pure derivations**: trip state, boards, line position and journeys are
//!   functions of the timetable and an injected query time
//! - **Validated data**: malformed schedules are rejected at load time
//! - **Status overlay**: delays, cancellations, platform changes and skipped
//!   stops layered over the immutable schedule
//! - **Route map support**: station R-tree and interpolated train coordinates
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use wsr_timetable::prelude::*;
//!
//! let engine = TimetableEngine::new(Arc::new(wsr_timetable::sample::west_somerset().unwrap()));
//! let query: ClockTime = "10:20".parse().unwrap();
//!
//! let state = engine.trip_state(&TripCode::new("1S01"), query).unwrap();
//! assert_eq!(state.lifecycle, TripLifecycle::Running);
//! assert_eq!(
//!     state.location,
//!     Some(TripLocation::Between(StationCode::new("BL"), StationCode::new("CH")))
//! );
//!
//! let board = engine.derive_departure_board(&StationCode::new("MIN"), query, 5);
//! assert_eq!(board.departures[0].time.to_string(), "12:20");
//! ```

pub mod engine;
pub mod identifiers;
pub mod models;
pub mod provider;
pub mod sample;
pub mod spatial;

#[cfg(feature = "dataset")]
pub mod dataset;

pub use geo;

// Re-exports for convenience
pub mod prelude {
    pub use crate::engine::{
        board::{BoardEntry, DepartureBoard},
        journey::{Journey, JourneySegment},
        overlay::{TripOverlay, TripUpdate},
        position::{DepartureCountdown, NextStop, TripProgress},
        state::{compute_trip_state, TripState},
        BoardPolicy, TimetableEngine,
    };
    pub use crate::identifiers::*;
    pub use crate::models::{calendar::*, schedule::*, traits::*, types::*};
    pub use crate::provider::StaticTimetable;
}

pub use prelude::*;
