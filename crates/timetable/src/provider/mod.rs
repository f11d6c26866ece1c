//! Timetable data providers.

pub mod static_provider;
pub mod validate;

pub use static_provider::StaticTimetable;
pub use validate::validate_trip;
