//! The West Somerset Railway as shipped with the viewer.
//!
//! Ten stations from Bishops Lydeard (milepost 0) to Minehead, and the
//! standard four-train-each-way service of the main season.

use std::sync::Arc;

use chrono::NaiveDate;
use geo::Point;

use crate::identifiers::ServiceIdentifier;
use crate::models::{calendar::*, schedule::*, types::*};
use crate::provider::StaticTimetable;

struct StationRow {
    code: &'static str,
    name: &'static str,
    lat: f64,
    lng: f64,
    milepost: f64,
    facilities: &'static [&'static str],
    platforms: &'static [&'static str],
    is_request_stop: bool,
    parking: bool,
    step_free_access: bool,
}

#[rustfmt::skip]
const STATIONS: &[StationRow] = &[
    StationRow { code: "MIN", name: "Minehead", lat: 51.206815, lng: -3.4711559, milepost: 22.75, facilities: &["Parking", "Toilets", "Cafe", "Shop", "Museum"], platforms: &["1", "2"], is_request_stop: false, parking: true, step_free_access: true },
    StationRow { code: "DUN", name: "Dunster", lat: 51.1931315884899, lng: -3.4385530693148945, milepost: 20.25, facilities: &["Parking", "Toilets"], platforms: &["1"], is_request_stop: false, parking: true, step_free_access: false },
    StationRow { code: "BA", name: "Blue Anchor", lat: 51.18177271081976, lng: -3.4012355263416287, milepost: 17.5, facilities: &["Parking", "Toilets", "Cafe"], platforms: &["1", "2"], is_request_stop: false, parking: true, step_free_access: true },
    StationRow { code: "WAS", name: "Washford", lat: 51.16169572799292, lng: -3.368545896756289, milepost: 15.5, facilities: &["Parking", "Toilets", "Museum"], platforms: &["1"], is_request_stop: false, parking: true, step_free_access: false },
    StationRow { code: "WAT", name: "Watchet", lat: 51.18083509803016, lng: -3.329631778829393, milepost: 13.25, facilities: &["Parking", "Toilets"], platforms: &["1"], is_request_stop: false, parking: true, step_free_access: true },
    StationRow { code: "DON", name: "Doniford Halt", lat: 51.17841737732154, lng: -3.3113258133497485, milepost: 11.75, facilities: &[], platforms: &["1"], is_request_stop: true, parking: false, step_free_access: false },
    StationRow { code: "WIL", name: "Williton", lat: 51.166215218812056, lng: -3.309489866648678, milepost: 9.25, facilities: &["Parking", "Toilets", "Cafe"], platforms: &["1", "2"], is_request_stop: false, parking: true, step_free_access: true },
    StationRow { code: "STO", name: "Stogumber", lat: 51.12791469181247, lng: -3.2733470229230224, milepost: 6.0, facilities: &["Parking"], platforms: &["1"], is_request_stop: false, parking: true, step_free_access: false },
    StationRow { code: "CH", name: "Crowcombe Heathfield", lat: 51.102683806851786, lng: -3.2338928074524973, milepost: 3.25, facilities: &[], platforms: &["1"], is_request_stop: false, parking: false, step_free_access: false },
    StationRow { code: "BL", name: "Bishops Lydeard", lat: 51.05526555357071, lng: -3.1939831447400424, milepost: 0.0, facilities: &["Parking", "Toilets", "Cafe", "Shop", "Museum"], platforms: &["1", "2"], is_request_stop: false, parking: true, step_free_access: true },
];

const NORTHBOUND: [&str; 10] = ["BL", "CH", "STO", "WIL", "DON", "WAT", "WAS", "BA", "DUN", "MIN"];
const SOUTHBOUND: [&str; 10] = ["MIN", "DUN", "BA", "WAS", "WAT", "DON", "WIL", "STO", "CH", "BL"];

/// (headcode, service id, class, notes, calling times, platforms)
type TripRow = (&'static str, &'static str, ServiceClass, Option<&'static str>, [&'static str; 10], [&'static str; 10]);

const STEAM_OR_DIESEL: Option<&str> = Some("Steam or Diesel service");

#[rustfmt::skip]
const NORTHBOUND_TRIPS: &[TripRow] = &[
    ("1S01", "NB_1015_BL_MIN_STEAM", ServiceClass::Steam, None,
        ["10:15", "10:28", "10:38", "10:50", "10:54", "11:00", "11:08", "11:18", "11:26", "11:35"],
        ["1", "1", "1", "1", "1", "1", "1", "1", "1", "1"]),
    ("2D02", "NB_1225_BL_MIN_SD", ServiceClass::Diesel, STEAM_OR_DIESEL,
        ["12:25", "12:38", "12:48", "13:00", "13:12", "13:18", "13:26", "13:35", "13:43", "13:50"],
        ["1", "1", "1", "1", "1", "1", "1", "1", "1", "1"]),
    ("3S03", "NB_1425_BL_MIN_STEAM", ServiceClass::Steam, None,
        ["14:25", "14:38", "14:48", "14:58", "15:12", "15:18", "15:26", "15:35", "15:43", "15:50"],
        ["2", "1", "1", "2", "1", "1", "2", "1", "1", "1"]),
    ("4D04", "NB_1640_BL_MIN_SD", ServiceClass::Diesel, STEAM_OR_DIESEL,
        ["16:40", "16:53", "17:03", "17:23", "17:27", "17:33", "17:41", "17:50", "17:57", "18:05"],
        ["1", "1", "1", "1", "1", "1", "1", "1", "1", "1"]),
];

#[rustfmt::skip]
const SOUTHBOUND_TRIPS: &[TripRow] = &[
    ("1D05", "SB_1000_MIN_BL_SD", ServiceClass::Diesel, STEAM_OR_DIESEL,
        ["10:00", "10:08", "10:17", "10:25", "10:35", "10:39", "10:43", "11:03", "11:12", "11:25"],
        ["1", "1", "2", "1", "1", "1", "1", "1", "1", "1"]),
    ("2S06", "SB_1220_MIN_BL_STEAM", ServiceClass::Steam, None,
        ["12:20", "12:28", "12:37", "12:45", "12:55", "12:59", "13:03", "13:16", "13:25", "13:37"],
        ["2", "1", "1", "2", "1", "1", "2", "1", "1", "2"]),
    ("3D07", "SB_1420_MIN_BL_SD", ServiceClass::Diesel, STEAM_OR_DIESEL,
        ["14:20", "14:28", "14:37", "14:45", "14:55", "14:59", "15:03", "15:16", "15:25", "15:37"],
        ["1", "1", "2", "1", "1", "1", "1", "1", "1", "1"]),
    ("4S08", "SB_1635_MIN_BL_STEAM", ServiceClass::Steam, None,
        ["16:35", "16:43", "16:52", "17:00", "17:10", "17:14", "17:18", "17:31", "17:40", "17:52"],
        ["2", "1", "1", "2", "1", "1", "2", "1", "1", "2"]),
    ("2C10", "SB_1635_MIN_BL", ServiceClass::Diesel, None,
        ["16:35", "16:43", "16:52", "17:00", "17:10", "17:14", "17:18", "17:31", "17:40", "17:52"],
        ["1", "1", "2", "1", "1", "1", "1", "1", "1", "1"]),
];

fn stations() -> Vec<Station> {
    STATIONS
        .iter()
        .map(|row| Station {
            code: row.code.into(),
            name: row.name.into(),
            location: Point::new(row.lng, row.lat),
            milepost: row.milepost,
            is_request_stop: row.is_request_stop,
            has_platform: true,
            facilities: row.facilities.iter().map(|&f| f.into()).collect(),
            platforms: row.platforms.iter().map(|&p| p.into()).collect(),
            parking: row.parking,
            step_free_access: row.step_free_access,
        })
        .collect()
}

/// Every call in the sample timetable is zero-dwell, so each time is both
/// the arrival and the departure.
fn trip(row: &TripRow, order: &[&str; 10], calendar: &Arc<ServiceCalendar>) -> Result<Trip> {
    let (code, service_id, class, notes, times, platforms) = row;
    let last = order.len() - 1;

    let stops = order
        .iter()
        .zip(times.iter().zip(platforms.iter()))
        .enumerate()
        .map(|(i, (station, (time, platform)))| -> Result<Stop> {
            let time: ClockTime = time.parse()?;
            let arrival = (i != 0).then_some(time);
            let departure = (i != last).then_some(time);
            Ok(Stop::new(*station, arrival, departure, Some(*platform)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut trip = Trip::new(*code, *service_id, *class, stops);
    trip.operator = Some("West Somerset Railway".into());
    trip.notes = notes.map(Into::into);
    trip.calendar = Some(calendar.clone());
    Ok(trip)
}

/// Main season calendar: daily from late March to the start of November 2025
pub fn main_season() -> ServiceCalendar {
    ServiceCalendar::daily(
        ServiceIdentifier::new("WSR_MAIN_2025"),
        NaiveDate::from_ymd_opt(2025, 3, 29).unwrap_or_default(),
        NaiveDate::from_ymd_opt(2025, 11, 2).unwrap_or_default(),
    )
}

/// Load the sample line
pub fn west_somerset() -> Result<StaticTimetable> {
    let calendar = Arc::new(main_season());

    let mut trips = Vec::new();
    for row in NORTHBOUND_TRIPS {
        trips.push(trip(row, &NORTHBOUND, &calendar)?);
    }
    for row in SOUTHBOUND_TRIPS {
        trips.push(trip(row, &SOUTHBOUND, &calendar)?);
    }

    StaticTimetable::from_data(stations(), trips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::traits::TimetableProvider;

    #[test]
    fn test_sample_loads() {
        let line = west_somerset().unwrap();
        assert_eq!(line.stations().len(), 10);
        assert_eq!(line.trips().len(), 9);
        assert_eq!(line.stations()[0].code.as_str(), "BL");
        assert_eq!(line.stations()[9].code.as_str(), "MIN");
    }

    #[test]
    fn test_doniford_is_request_stop() {
        let line = west_somerset().unwrap();
        let trip = line.get_trip(&"1S01".into()).unwrap();
        let doniford = trip.stop_at(&"DON".into()).unwrap();
        assert!(doniford.is_request_stop);
        assert_eq!(line.direction(&trip), Direction::Outbound);

        let southbound = line.get_trip(&"1D05".into()).unwrap();
        assert_eq!(line.direction(&southbound), Direction::Inbound);
    }
}
