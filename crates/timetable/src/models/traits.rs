//! Provider trait for timetable data.
//!
//! The engine only sees the line through this trait. The in-memory
//! [`StaticTimetable`](crate::provider::StaticTimetable) is the implementation
//! used today; a store-backed one can slot in behind the same lookups.

use std::sync::Arc;

use geo::Point;

use crate::identifiers::*;
use crate::models::schedule::{Station, Trip};
use crate::models::types::Direction;

/// Provider of all reference data with lookup and query methods
pub trait TimetableProvider: Send + Sync {
    // ---- Lookups ----
    fn get_station(&self, code: &StationCode) -> Option<Arc<Station>>;
    fn get_trip(&self, code: &TripCode) -> Option<Arc<Trip>>;

    // ---- Collections ----

    /// Stations in line order (ascending milepost)
    fn stations(&self) -> &[Arc<Station>];

    /// Trips in the order they were loaded
    fn trips(&self) -> &[Arc<Trip>];

    // ---- Line geometry ----

    /// Position of a station in line order
    fn line_index(&self, code: &StationCode) -> Option<usize>;

    /// Direction implied by the milepost order of origin and destination
    fn direction(&self, trip: &Trip) -> Direction {
        let milepost = |code: Option<&StationCode>| code.and_then(|c| self.get_station(c)).map(|s| s.milepost);
        let origin = milepost(trip.origin());
        let destination = milepost(trip.destination());
        match (origin, destination) {
            (Some(o), Some(d)) if d < o => Direction::Inbound,
            _ => Direction::Outbound,
        }
    }

    /// Display name for a station code, falling back to the code itself
    fn station_name(&self, code: &StationCode) -> Arc<str> {
        self.get_station(code)
            .map(|station| station.name.clone())
            .unwrap_or_else(|| code.as_str().into())
    }

    // ---- Spatial queries ----

    /// Find stations within radius (meters)
    fn stations_near(&self, point: Point, radius_m: f64) -> Vec<Arc<Station>>;

    /// Find the N nearest stations to a point
    fn nearest_stations(&self, point: Point, n: usize) -> Vec<Arc<Station>>;
}
