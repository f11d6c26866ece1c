//! JSON dataset loading.
//!
//! The dataset is the static configuration the viewer starts from: the
//! station list and every trip with its calling pattern. Field names follow
//! the camelCase documents the viewer was first fed with.
//!
//! ```json
//! {
//!   "stations": [
//!     { "code": "BL", "name": "Bishops Lydeard",
//!       "coordinates": { "lat": 51.0553, "lng": -3.1940 }, "milepost": 0 }
//!   ],
//!   "trips": [
//!     { "id": "1S01", "serviceId": "NB_1015_BL_MIN_STEAM", "serviceType": "Steam",
//!       "stops": [
//!         { "stationCode": "BL", "scheduledDeparture": "10:15", "platform": "1" },
//!         { "stationCode": "MIN", "scheduledArrival": "11:35" }
//!       ] }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use geo::Point;
use serde::{Deserialize, Serialize};

use crate::identifiers::*;
use crate::models::{calendar::*, schedule::*, types::*};
use crate::provider::StaticTimetable;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub stations: Vec<StationRecord>,
    pub trips: Vec<TripRecord>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    pub code: StationCode,
    pub name: String,
    pub coordinates: Coordinates,
    pub milepost: f64,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub is_request_stop: bool,
    #[serde(default = "default_true")]
    pub has_platform: bool,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub step_free_access: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRecord {
    pub station_code: StationCode,
    #[serde(default)]
    pub scheduled_arrival: Option<ClockTime>,
    #[serde(default)]
    pub scheduled_departure: Option<ClockTime>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRecord {
    pub service_id: ServiceIdentifier,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    /// 0 is Sunday
    pub days_of_week: Vec<u32>,
    #[serde(default)]
    pub added_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub removed_dates: Vec<NaiveDate>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    pub id: TripCode,
    pub service_id: ServiceIdentifier,
    pub service_type: ServiceClass,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub calendar: Option<CalendarRecord>,
    pub stops: Vec<StopRecord>,
}

impl From<StationRecord> for Station {
    fn from(record: StationRecord) -> Self {
        Station {
            code: record.code,
            name: record.name.into(),
            location: Point::new(record.coordinates.lng, record.coordinates.lat),
            milepost: record.milepost,
            is_request_stop: record.is_request_stop,
            has_platform: record.has_platform,
            facilities: record.facilities.into_iter().map(Into::into).collect(),
            platforms: record.platforms.into_iter().map(Into::into).collect(),
            parking: record.parking,
            step_free_access: record.step_free_access,
        }
    }
}

impl From<CalendarRecord> for ServiceCalendar {
    fn from(record: CalendarRecord) -> Self {
        ServiceCalendar {
            service_id: record.service_id,
            start_date: record.valid_from,
            end_date: record.valid_to,
            weekdays: WeekdayFlags::from_day_numbers(&record.days_of_week),
            added_dates: Arc::new(record.added_dates.into_iter().collect::<HashSet<_>>()),
            removed_dates: Arc::new(record.removed_dates.into_iter().collect::<HashSet<_>>()),
        }
    }
}

impl From<TripRecord> for Trip {
    fn from(record: TripRecord) -> Self {
        let stops = record
            .stops
            .into_iter()
            .map(|stop| Stop {
                station: stop.station_code,
                arrival: stop.scheduled_arrival,
                departure: stop.scheduled_departure,
                platform: stop.platform.map(Into::into),
                is_request_stop: false,
            })
            .collect();

        let mut trip = Trip::new(record.id, record.service_id, record.service_type, stops);
        trip.operator = record.operator.map(Into::into);
        trip.notes = record.notes.map(Into::into);
        trip.calendar = record.calendar.map(|calendar| Arc::new(calendar.into()));
        trip
    }
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TimetableError::Dataset(e.to_string()))
    }

    /// Validate and index the dataset
    pub fn into_timetable(self) -> Result<StaticTimetable> {
        StaticTimetable::from_data(
            self.stations.into_iter().map(Into::into).collect(),
            self.trips.into_iter().map(Into::into).collect(),
        )
    }
}

impl StaticTimetable {
    /// Parse and load a JSON dataset
    pub fn from_json(json: &str) -> Result<Self> {
        Dataset::from_json(json)?.into_timetable()
    }
}
