//! Static reference data: stations on the line and the trips that serve them.

use std::sync::Arc;

use chrono::NaiveDate;
use geo::Point;

use crate::identifiers::*;
use crate::models::calendar::ServiceCalendar;
use crate::models::types::*;

/// A station on the line
#[derive(Clone, Debug)]
pub struct Station {
    pub code: StationCode,
    pub name: Arc<str>,
    /// x = longitude, y = latitude
    pub location: Point,
    /// Distance along the line in miles; ascending mileposts give the line order
    pub milepost: f64,
    pub is_request_stop: bool,
    pub has_platform: bool,
    pub facilities: Vec<Arc<str>>,
    pub platforms: Vec<Arc<str>>,
    pub parking: bool,
    pub step_free_access: bool,
}

impl Station {
    /// A platformed, non-request station with no facilities listed
    pub fn new(code: impl Into<StationCode>, name: &str, location: Point, milepost: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            location,
            milepost,
            is_request_stop: false,
            has_platform: true,
            facilities: Vec::new(),
            platforms: Vec::new(),
            parking: false,
            step_free_access: false,
        }
    }
}

/// One station visit within a trip
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub station: StationCode,
    /// Absent only for the first stop
    pub arrival: Option<ClockTime>,
    /// Absent only for the last stop
    pub departure: Option<ClockTime>,
    pub platform: Option<Arc<str>>,
    /// Copied from the station when the timetable is loaded
    pub is_request_stop: bool,
}

impl Stop {
    pub fn new(
        station: impl Into<StationCode>,
        arrival: Option<ClockTime>,
        departure: Option<ClockTime>,
        platform: Option<&str>,
    ) -> Self {
        Self {
            station: station.into(),
            arrival,
            departure,
            platform: platform.map(Into::into),
            is_request_stop: false,
        }
    }

    pub fn stop_type(&self) -> StopType {
        match (self.arrival, self.departure) {
            (None, _) => StopType::Origin,
            (_, None) => StopType::Destination,
            _ => StopType::Intermediate,
        }
    }

    /// Minutes spent standing at the stop, if it has both times
    pub fn dwell_minutes(&self) -> Option<i32> {
        Some(self.arrival?.minutes_until(self.departure?))
    }
}

/// One scheduled end-to-end train run
#[derive(Clone, Debug)]
pub struct Trip {
    pub code: TripCode,
    pub service_id: ServiceIdentifier,
    pub service_class: ServiceClass,
    pub stops: Vec<Stop>,
    pub operator: Option<Arc<str>>,
    pub notes: Option<Arc<str>>,
    /// Days the trip runs; `None` means every day
    pub calendar: Option<Arc<ServiceCalendar>>,
}

impl Trip {
    pub fn new(
        code: impl Into<TripCode>,
        service_id: impl Into<ServiceIdentifier>,
        service_class: ServiceClass,
        stops: Vec<Stop>,
    ) -> Self {
        Self {
            code: code.into(),
            service_id: service_id.into(),
            service_class,
            stops,
            operator: None,
            notes: None,
            calendar: None,
        }
    }

    /// `None` only for a trip with no stops, which the provider never loads
    pub fn origin(&self) -> Option<&StationCode> {
        self.stops.first().map(|stop| &stop.station)
    }

    pub fn destination(&self) -> Option<&StationCode> {
        self.stops.last().map(|stop| &stop.station)
    }

    pub fn first_departure(&self) -> Option<ClockTime> {
        self.stops.first()?.departure
    }

    pub fn last_arrival(&self) -> Option<ClockTime> {
        self.stops.last()?.arrival
    }

    pub fn stop_index(&self, station: &StationCode) -> Option<usize> {
        self.stops.iter().position(|stop| &stop.station == station)
    }

    pub fn stop_at(&self, station: &StationCode) -> Option<&Stop> {
        self.stops.iter().find(|stop| &stop.station == station)
    }

    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.calendar.as_ref().map_or(true, |calendar| calendar.runs_on(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Option<ClockTime> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_stop_type_and_dwell() {
        let origin = Stop::new("BL", None, t("10:15"), Some("1"));
        let middle = Stop::new("WIL", t("10:50"), t("10:52"), None);
        let end = Stop::new("MIN", t("11:35"), None, None);

        assert_eq!(origin.stop_type(), StopType::Origin);
        assert_eq!(middle.stop_type(), StopType::Intermediate);
        assert_eq!(end.stop_type(), StopType::Destination);

        assert_eq!(middle.dwell_minutes(), Some(2));
        assert_eq!(origin.dwell_minutes(), None);
    }

    #[test]
    fn test_trip_lookups() {
        let trip = Trip::new(
            "1S01",
            "NB_1015_BL_MIN_STEAM",
            ServiceClass::Steam,
            vec![
                Stop::new("BL", None, t("10:15"), None),
                Stop::new("CH", t("10:28"), t("10:28"), None),
                Stop::new("MIN", t("11:35"), None, None),
            ],
        );

        assert_eq!(trip.origin().map(|s| s.as_str()), Some("BL"));
        assert_eq!(trip.destination().map(|s| s.as_str()), Some("MIN"));
        assert_eq!(trip.first_departure(), t("10:15"));
        assert_eq!(trip.last_arrival(), t("11:35"));
        assert_eq!(trip.stop_index(&StationCode::new("CH")), Some(1));
        assert!(trip.stop_at(&StationCode::new("WIL")).is_none());
        assert!(trip.runs_on(NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()));
    }
}
