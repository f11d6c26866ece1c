//! Timetable data models, types, and traits.

pub mod calendar;
pub mod schedule;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use calendar::{ServiceCalendar, WeekdayFlags};
pub use schedule::{Station, Stop, Trip};
pub use traits::TimetableProvider;
pub use types::{
    ClockTime, Direction, Result, ServiceClass, StopStatus, StopType, TimetableError, TripLifecycle,
    TripLocation, TripStatus,
};
