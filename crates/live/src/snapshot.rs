//! Everything the displays need at one query time.

use std::collections::HashMap;
use std::sync::Arc;

use wsr_timetable::prelude::*;

/// Per-trip view published to trip subscribers
#[derive(Clone, Debug)]
pub struct TripSnapshot {
    pub trip: Arc<Trip>,
    pub state: TripState,
    pub status: TripStatus,
    /// Percent along the line from the lowest milepost
    pub line_position: f64,
    pub next_stop: Option<NextStop>,
}

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub as_of: Option<ClockTime>,
    pub trips: HashMap<TripCode, Arc<TripSnapshot>>,
    pub boards: HashMap<StationCode, Arc<DepartureBoard>>,
}

impl Snapshot {
    /// Derive every trip and every station board at `query`
    pub fn compute(engine: &TimetableEngine, query: ClockTime, board_limit: usize) -> Self {
        let trips = engine
            .provider()
            .trips()
            .iter()
            .map(|trip| {
                let state = engine.compute_trip_state(trip, query);
                let snapshot = TripSnapshot {
                    trip: trip.clone(),
                    status: engine.trip_status(trip, query),
                    line_position: engine.line_position(trip, &state),
                    next_stop: engine.time_to_next_stop(trip, query),
                    state,
                };
                (trip.code.clone(), Arc::new(snapshot))
            })
            .collect();

        let boards = engine
            .provider()
            .stations()
            .iter()
            .map(|station| {
                let board = engine.derive_departure_board(&station.code, query, board_limit);
                (station.code.clone(), Arc::new(board))
            })
            .collect();

        Snapshot {
            as_of: Some(query),
            trips,
            boards,
        }
    }

    pub fn trip(&self, code: &TripCode) -> Option<&Arc<TripSnapshot>> {
        self.trips.get(code)
    }

    pub fn board(&self, station: &StationCode) -> Option<&Arc<DepartureBoard>> {
        self.boards.get(station)
    }

    /// Trips currently on the line
    pub fn running(&self) -> impl Iterator<Item = &Arc<TripSnapshot>> {
        self.trips
            .values()
            .filter(|trip| trip.state.lifecycle == TripLifecycle::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsr_timetable::sample;

    fn engine() -> TimetableEngine {
        TimetableEngine::new(Arc::new(sample::west_somerset().unwrap()))
    }

    #[test]
    fn test_snapshot_covers_line() {
        let snapshot = Snapshot::compute(&engine(), ClockTime::at(10, 20), 5);
        assert_eq!(snapshot.as_of, Some(ClockTime::at(10, 20)));
        assert_eq!(snapshot.trips.len(), 9);
        assert_eq!(snapshot.boards.len(), 10);
        assert!(snapshot.boards.values().all(|board| board.departures.len() <= 5));

        let first = snapshot.trip(&"1S01".into()).unwrap();
        assert_eq!(first.state.lifecycle, TripLifecycle::Running);
        assert_eq!(
            first.state.location,
            Some(TripLocation::Between("BL".into(), "CH".into()))
        );
        assert_eq!(first.next_stop.as_ref().map(|n| n.minutes), Some(8));
    }

    #[test]
    fn test_running_excludes_trips_yet_to_start() {
        let snapshot = Snapshot::compute(&engine(), ClockTime::at(10, 20), 10);
        let mut running: Vec<&str> = snapshot.running().map(|t| t.trip.code.as_str()).collect();
        running.sort();
        assert_eq!(running, ["1D05", "1S01"]);

        let quiet = Snapshot::compute(&engine(), ClockTime::at(9, 0), 10);
        assert_eq!(quiet.running().count(), 0);
    }

    #[test]
    fn test_running_trips() {
        let snapshot = Snapshot::compute(&engine(), ClockTime::at(17, 45), 10);
        let mut running: Vec<&str> = snapshot.running().map(|t| t.trip.code.as_str()).collect();
        running.sort();
        assert_eq!(running, ["2C10", "4D04", "4S08"]);
    }
}
