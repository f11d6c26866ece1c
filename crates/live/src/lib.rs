//! # wsr-live
//!
//! Keeps displays current by re-deriving the timetable on a timer.
//!
//! A single task owns the [`TimetableEngine`](wsr_timetable::TimetableEngine).
//! On every tick it reads the query time from a [`QueryClock`], recomputes a
//! full [`Snapshot`], and fans the per-trip and per-station parts out to
//! subscribers. Status updates reach the engine as commands through the same
//! task, so there is only ever one writer.

pub mod clock;
pub mod service;
pub mod snapshot;
pub mod subscription;

pub use clock::{ManualClock, QueryClock, SystemClock};
pub use service::{LiveConfig, LiveError, LiveHandle, LiveTimetable};
pub use snapshot::{Snapshot, TripSnapshot};
pub use subscription::{Subscription, SubscriptionId};
