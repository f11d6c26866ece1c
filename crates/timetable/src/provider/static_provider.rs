//! In-memory timetable provider.
//!
//! Holds the whole line in memory with lookup maps and a station R-tree. The
//! data is loaded once, validated, and never structurally changed afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use geo::Point;
use rstar::RTree;

use crate::identifiers::*;
use crate::models::{schedule::*, traits::*, types::*};
use crate::provider::validate::validate_trip;
use crate::spatial::index::StationNode;
use crate::spatial::queries::{haversine_distance, meters_to_degrees_approx};

/// In-memory timetable provider with spatial indexing
///
/// This type is cheap to clone since all data is stored in `Arc`s.
#[derive(Clone)]
pub struct StaticTimetable {
    // Core data
    stations: Vec<Arc<Station>>,
    trips: Vec<Arc<Trip>>,

    // Lookup maps
    station_map: HashMap<StationCode, Arc<Station>>,
    trip_map: HashMap<TripCode, Arc<Trip>>,
    line_index: HashMap<StationCode, usize>,

    // Spatial index
    station_tree: RTree<StationNode>,
}

impl StaticTimetable {
    /// Create a new empty provider
    pub fn new() -> Self {
        Self {
            stations: Vec::new(),
            trips: Vec::new(),
            station_map: HashMap::new(),
            trip_map: HashMap::new(),
            line_index: HashMap::new(),
            station_tree: RTree::new(),
        }
    }

    /// Build a provider from raw data.
    ///
    /// Stations are put into line order by milepost. Every trip is validated
    /// and the first malformed one fails the whole load. Each stop's request
    /// flag is copied from its station.
    pub fn from_data(stations: Vec<Station>, trips: Vec<Trip>) -> Result<Self> {
        let mut stations = stations;
        stations.sort_by(|a, b| a.milepost.total_cmp(&b.milepost));
        let stations: Vec<Arc<Station>> = stations.into_iter().map(Arc::new).collect();

        // Build lookup maps
        let mut station_map = HashMap::with_capacity(stations.len());
        for station in &stations {
            if station_map.insert(station.code.clone(), station.clone()).is_some() {
                return Err(TimetableError::InvalidData(format!("duplicate station code {}", station.code)));
            }
        }

        let line_index: HashMap<_, _> = stations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.code.clone(), i))
            .collect();

        let mut trip_map = HashMap::with_capacity(trips.len());
        let mut loaded = Vec::with_capacity(trips.len());
        for mut trip in trips {
            if let Err(err) = validate_trip(&trip, &station_map) {
                tracing::warn!("rejecting trip {}: {err}", trip.code);
                return Err(err);
            }

            for stop in &mut trip.stops {
                stop.is_request_stop = station_map[&stop.station].is_request_stop;
            }

            let trip = Arc::new(trip);
            if trip_map.insert(trip.code.clone(), trip.clone()).is_some() {
                return Err(TimetableError::InvalidData(format!("duplicate trip code {}", trip.code)));
            }
            loaded.push(trip);
        }

        // Build spatial index
        let station_tree = RTree::bulk_load(stations.iter().cloned().map(StationNode::new).collect());

        tracing::debug!("loaded timetable with {} stations and {} trips", stations.len(), loaded.len());

        Ok(Self {
            stations,
            trips: loaded,
            station_map,
            trip_map,
            line_index,
            station_tree,
        })
    }
}

impl Default for StaticTimetable {
    fn default() -> Self {
        Self::new()
    }
}

impl TimetableProvider for StaticTimetable {
    fn get_station(&self, code: &StationCode) -> Option<Arc<Station>> {
        self.station_map.get(code).cloned()
    }

    fn get_trip(&self, code: &TripCode) -> Option<Arc<Trip>> {
        self.trip_map.get(code).cloned()
    }

    fn stations(&self) -> &[Arc<Station>] {
        &self.stations
    }

    fn trips(&self) -> &[Arc<Trip>] {
        &self.trips
    }

    fn line_index(&self, code: &StationCode) -> Option<usize> {
        self.line_index.get(code).copied()
    }

    fn stations_near(&self, point: Point, radius_m: f64) -> Vec<Arc<Station>> {
        // Validate radius is positive
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Vec::new();
        }

        // A degree of longitude shrinks with latitude, so widen the pre-filter to match
        let cos_lat = point.y().to_radians().cos().max(0.01);
        let radius_deg = meters_to_degrees_approx(radius_m) / cos_lat;

        let mut found: Vec<(f64, Arc<Station>)> = self
            .station_tree
            .locate_within_distance([point.x(), point.y()], radius_deg * radius_deg)
            .map(|node| (haversine_distance(point, node.location()), node.station.clone()))
            .filter(|(distance, _)| *distance <= radius_m)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));

        found.into_iter().map(|(_, station)| station).collect()
    }

    fn nearest_stations(&self, point: Point, n: usize) -> Vec<Arc<Station>> {
        self.station_tree
            .nearest_neighbor_iter(&[point.x(), point.y()])
            .take(n)
            .map(|node| node.station.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Option<ClockTime> {
        Some(s.parse().unwrap())
    }

    fn stations() -> Vec<Station> {
        let mut doniford = Station::new("DON", "Doniford Halt", Point::new(-3.3113, 51.1784), 11.75);
        doniford.is_request_stop = true;
        vec![
            Station::new("MIN", "Minehead", Point::new(-3.4712, 51.2068), 22.75),
            doniford,
            Station::new("BL", "Bishops Lydeard", Point::new(-3.1940, 51.0553), 0.0),
        ]
    }

    fn trip(code: &str) -> Trip {
        Trip::new(
            code,
            "NB",
            ServiceClass::Steam,
            vec![
                Stop::new("BL", None, t("10:15"), None),
                Stop::new("DON", t("10:54"), t("10:54"), None),
                Stop::new("MIN", t("11:35"), None, None),
            ],
        )
    }

    #[test]
    fn test_empty_provider() {
        let provider = StaticTimetable::new();
        assert_eq!(provider.stations().len(), 0);
        assert_eq!(provider.trips().len(), 0);
    }

    #[test]
    fn test_line_order_by_milepost() {
        let provider = StaticTimetable::from_data(stations(), vec![]).unwrap();
        let order: Vec<&str> = provider.stations().iter().map(|s| s.code.as_str()).collect();
        assert_eq!(order, ["BL", "DON", "MIN"]);
        assert_eq!(provider.line_index(&StationCode::new("MIN")), Some(2));
        assert_eq!(provider.line_index(&StationCode::new("XYZ")), None);
    }

    #[test]
    fn test_request_flag_copied_to_stops() {
        let provider = StaticTimetable::from_data(stations(), vec![trip("1S01")]).unwrap();
        let trip = provider.get_trip(&TripCode::new("1S01")).unwrap();
        assert!(!trip.stops[0].is_request_stop);
        assert!(trip.stops[1].is_request_stop);
        assert_eq!(provider.direction(&trip), Direction::Outbound);
    }

    #[test]
    fn test_duplicates_rejected() {
        let err = StaticTimetable::from_data(stations(), vec![trip("1S01"), trip("1S01")]);
        assert!(matches!(err, Err(TimetableError::InvalidData(_))));

        let mut doubled = stations();
        doubled.push(Station::new("BL", "Again", Point::new(0.0, 0.0), 1.0));
        assert!(StaticTimetable::from_data(doubled, vec![]).is_err());
    }

    #[test]
    fn test_malformed_trip_fails_load() {
        let mut bad = trip("9X99");
        bad.stops[1].arrival = t("10:00");
        let err = StaticTimetable::from_data(stations(), vec![bad]);
        assert!(matches!(err, Err(TimetableError::MalformedSchedule { .. })));
    }

    #[test]
    fn test_spatial_queries() {
        let provider = StaticTimetable::from_data(stations(), vec![]).unwrap();

        let near_minehead = Point::new(-3.47, 51.20);
        let nearby = provider.stations_near(near_minehead, 2_000.0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].code.as_str(), "MIN");

        assert!(provider.stations_near(near_minehead, -5.0).is_empty());

        let nearest = provider.nearest_stations(Point::new(-3.20, 51.06), 2);
        assert_eq!(nearest[0].code.as_str(), "BL");
        assert_eq!(nearest[1].code.as_str(), "DON");
    }
}
