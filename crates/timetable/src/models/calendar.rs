//! Operating calendar for heritage services.
//!
//! Heritage lines run seasonal timetables: a date range, a set of weekdays,
//! plus gala days added and closure days removed.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;
use std::sync::Arc;

use crate::identifiers::ServiceIdentifier;

/// Determines which days a timetable operates
#[derive(Clone, Debug)]
pub struct ServiceCalendar {
    pub service_id: ServiceIdentifier,

    // Regular season
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekdays: WeekdayFlags,

    // Exception dates
    pub added_dates: Arc<HashSet<NaiveDate>>,   // Specials and gala days
    pub removed_dates: Arc<HashSet<NaiveDate>>, // Closures
}

/// Compact representation of which weekdays a service runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeekdayFlags {
    pub(crate) flags: u8,
}

impl WeekdayFlags {
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    pub fn all() -> Self {
        Self { flags: 0b1111_1110 }
    }

    pub fn set(&mut self, weekday: Weekday) {
        self.flags |= 1 << weekday.number_from_monday();
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        (self.flags & (1 << weekday.number_from_monday())) != 0
    }

    /// Build from day numbers where 0 is Sunday and 6 is Saturday.
    ///
    /// Out-of-range numbers are ignored.
    pub fn from_day_numbers(days: &[u32]) -> Self {
        let mut flags = Self::new();
        for &day in days {
            let weekday = match day {
                0 => Weekday::Sun,
                1 => Weekday::Mon,
                2 => Weekday::Tue,
                3 => Weekday::Wed,
                4 => Weekday::Thu,
                5 => Weekday::Fri,
                6 => Weekday::Sat,
                _ => continue,
            };
            flags.set(weekday);
        }
        flags
    }
}

impl ServiceCalendar {
    /// A calendar running every day between two dates inclusive
    pub fn daily(service_id: ServiceIdentifier, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            service_id,
            start_date,
            end_date,
            weekdays: WeekdayFlags::all(),
            added_dates: Arc::default(),
            removed_dates: Arc::default(),
        }
    }

    /// Check if the service runs on a given date
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        if self.added_dates.contains(&date) {
            return true;
        }

        if self.removed_dates.contains(&date) {
            return false;
        }

        if date < self.start_date || date > self.end_date {
            return false;
        }

        self.weekdays.contains(date.weekday())
    }
}
