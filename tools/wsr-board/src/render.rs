//! Plain-text output.

use wsr_timetable::prelude::*;

pub fn board(engine: &TimetableEngine, board: &DepartureBoard) {
    let name = engine.provider().station_name(&board.station);
    println!("{name} ({}) from {}", board.station, board.effective_time);

    println!("Departures");
    if board.departures.is_empty() {
        println!("  none");
    }
    for entry in &board.departures {
        entry_line(entry);
    }

    println!("Arrivals");
    if board.arrivals.is_empty() {
        println!("  none");
    }
    for entry in &board.arrivals {
        entry_line(entry);
    }
}

fn entry_line(entry: &BoardEntry) {
    println!(
        "  {}  {:<22} plat {:<2} {:<8} {}",
        entry.time,
        entry.terminus,
        entry.platform.as_deref().unwrap_or("-"),
        entry.service_class,
        entry.status,
    );
}

/// Origin and destination names
pub fn endpoints(engine: &TimetableEngine, trip: &Trip) -> (String, String) {
    let name = |code: Option<&StationCode>| {
        code.map(|code| engine.provider().station_name(code).to_string())
            .unwrap_or_default()
    };
    (name(trip.origin()), name(trip.destination()))
}

pub fn trip_line(engine: &TimetableEngine, trip: &Trip, state: &TripState) {
    let position = engine.line_position(trip, state);
    let location = match &state.location {
        Some(location) => location.to_string(),
        None => state.lifecycle.to_string(),
    };
    println!("{:<5} {:>5.1}%  {location}", trip.code, position);
}

pub fn trip(engine: &TimetableEngine, trip: &Trip, query: ClockTime) {
    let state = engine.compute_trip_state(trip, query);
    let status = engine.trip_status(trip, query);
    let progress = engine.trip_progress(trip, query);

    let (origin, destination) = endpoints(engine, trip);
    println!("{} {} {origin} to {destination}", trip.code, trip.service_class);
    println!("{} at {query}, {}", state.lifecycle, TripStatus::delay_text(status.delay_minutes));
    if let Some(message) = &status.message {
        println!("{message}");
    }
    if let Some(location) = &state.location {
        println!("Location: {location}");
    }
    if let Some(next) = engine.time_to_next_stop(trip, query) {
        println!("Next stop: {} in {next}", engine.provider().station_name(&next.station));
    }
    if let Some(point) = engine.train_coordinate(trip, query) {
        println!("Position: {:.5}, {:.5}", point.y(), point.x());
    }
    println!("Progress: {:.0}%", progress.percentage);

    for (stop, tag) in trip.stops.iter().zip(&state.stop_tags) {
        let time = stop.departure.or(stop.arrival).map(|t| t.to_string()).unwrap_or_default();
        println!("  {time:>5}  {:<22} {tag}", engine.provider().station_name(&stop.station));
    }
}

pub fn journey(journey: &Journey) {
    for segment in &journey.segments {
        println!(
            "{} -> {}  {:<5} {:<8} {} min",
            segment.departure, segment.arrival, segment.trip, segment.service_class, journey.duration_minutes,
        );
    }
}
