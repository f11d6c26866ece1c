use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt};
use wsr_live::{LiveConfig, LiveTimetable, ManualClock, QueryClock, SystemClock};
use wsr_timetable::geo::Point;
use wsr_timetable::prelude::*;

mod render;

#[derive(Parser, Debug)]
#[command(
    name = "wsr-board",
    author,
    version,
    about = "Departure boards and live train positions for the West Somerset Railway",
    long_about = "Derives train positions, station boards and direct journeys from a static \
                  timetable at a given time of day.\n\n\
                  Without --data the built-in main-season timetable is used."
)]
struct Args {
    /// JSON timetable dataset
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Query time as HH:MM (defaults to the local clock)
    #[arg(short, long, global = true)]
    at: Option<ClockTime>,

    /// Verbose output (show debug messages)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Departures and arrivals at a station
    Board {
        station: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// State, progress and next stop of one trip
    Trip { code: String },
    /// Trips on the line now
    Running,
    /// Trips leaving soon
    Upcoming,
    /// Direct trains between two stations
    Journeys {
        from: String,
        to: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// Every station in line order
    Stations,
    /// Stations close to a coordinate
    Near {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in meters; without it the three nearest are shown
        #[arg(short, long)]
        radius: Option<f64>,
    },
    /// Follow a station board or trip as it updates
    Watch {
        #[arg(long, conflicts_with = "trip")]
        station: Option<String>,
        #[arg(long)]
        trip: Option<String>,
        /// Seconds between refreshes
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
}

fn setup_logging(verbose: bool) {
    let max_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = FilterFn::new(move |meta| meta.target().starts_with("wsr") && *meta.level() <= max_level);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_timetable(data: Option<&PathBuf>) -> Result<StaticTimetable> {
    match data {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            StaticTimetable::from_json(&json)
                .with_context(|| format!("Failed to load timetable from {}", path.display()))
        }
        None => wsr_timetable::sample::west_somerset().context("Failed to load built-in timetable"),
    }
}

fn station_code(engine: &TimetableEngine, code: &str) -> Result<StationCode> {
    let code = StationCode::new(code.to_uppercase());
    if engine.provider().get_station(&code).is_none() {
        bail!("Unknown station {code}");
    }
    Ok(code)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let timetable = load_timetable(args.data.as_ref())?;
    let engine = TimetableEngine::new(Arc::new(timetable));
    let clock: Arc<dyn QueryClock> = match args.at {
        Some(at) => Arc::new(ManualClock::new(at)),
        None => Arc::new(SystemClock),
    };
    let now = clock.now();
    tracing::debug!(%now, stations = engine.provider().stations().len(), trips = engine.provider().trips().len(), "timetable loaded");

    match args.command {
        Command::Board { station, limit } => {
            let station = station_code(&engine, &station)?;
            let limit = limit.unwrap_or(engine.policy().default_limit);
            let board = engine.derive_departure_board(&station, now, limit);
            render::board(&engine, &board);
        }
        Command::Trip { code } => {
            let code = TripCode::new(code.to_uppercase());
            let trip = engine
                .provider()
                .get_trip(&code)
                .with_context(|| format!("Unknown trip {code}"))?;
            render::trip(&engine, &trip, now);
        }
        Command::Running => {
            for (trip, state) in engine.active_trips(now).iter().filter(|(_, state)| state.lifecycle == TripLifecycle::Running) {
                render::trip_line(&engine, trip, state);
            }
        }
        Command::Upcoming => {
            for trip in engine.upcoming_departures(now) {
                let Some(countdown) = engine.time_to_departure(&trip, now) else {
                    continue;
                };
                let (origin, destination) = render::endpoints(&engine, &trip);
                println!(
                    "{}  {:<5} {origin} to {destination}, leaving in {countdown}",
                    countdown.departure, trip.code,
                );
            }
        }
        Command::Journeys { from, to, limit } => {
            let from = station_code(&engine, &from)?;
            let to = station_code(&engine, &to)?;
            let journeys = engine.find_direct_journeys(&from, &to, now, limit);
            if journeys.is_empty() {
                println!("No direct trains after {now}");
            }
            for journey in &journeys {
                render::journey(journey);
            }
        }
        Command::Stations => {
            for station in engine.provider().stations() {
                let request = if station.is_request_stop { " (request stop)" } else { "" };
                println!("{:>6.2}  {:<4} {}{request}", station.milepost, station.code, station.name);
            }
        }
        Command::Near { lat, lng, radius } => {
            let point = Point::new(lng, lat);
            let stations = match radius {
                Some(radius) => engine.provider().stations_near(point, radius),
                None => engine.provider().nearest_stations(point, 3),
            };
            for station in stations {
                let meters = wsr_timetable::spatial::haversine_distance(point, station.location);
                println!("{:>7.0} m  {:<4} {}", meters, station.code, station.name);
            }
        }
        Command::Watch { station, trip, interval } => {
            let config = LiveConfig {
                tick_interval: Duration::from_secs(interval.max(1)),
                ..LiveConfig::default()
            };
            let station = station.map(|s| station_code(&engine, &s)).transpose()?;
            let trip = trip.map(|t| TripCode::new(t.to_uppercase()));
            watch(engine, clock, config, station, trip).await?;
        }
    }

    Ok(())
}

async fn watch(
    engine: TimetableEngine,
    clock: Arc<dyn QueryClock>,
    config: LiveConfig,
    station: Option<StationCode>,
    trip: Option<TripCode>,
) -> Result<()> {
    let live = LiveTimetable::spawn(engine.clone(), clock, config);

    match (station, trip) {
        (_, Some(code)) => {
            let trip = engine
                .provider()
                .get_trip(&code)
                .with_context(|| format!("Unknown trip {code}"))?;
            if let Some(current) = live.latest().trip(&code) {
                render::trip_line(&engine, &trip, &current.state);
            }
            let mut updates = live.subscribe_trip(code);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    update = updates.recv() => match update {
                        Some(update) => render::trip_line(&engine, &update.trip, &update.state),
                        None => break,
                    },
                }
            }
        }
        (Some(code), None) => {
            if let Some(board) = live.latest().board(&code) {
                render::board(&engine, board);
            }
            let mut updates = live.subscribe_station(code);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    update = updates.recv() => match update {
                        Some(board) => render::board(&engine, &board),
                        None => break,
                    },
                }
            }
        }
        (None, None) => {
            let mut snapshots = live.watch();
            loop {
                {
                    let snapshot = snapshots.borrow_and_update();
                    let mut running: Vec<_> = snapshot.running().collect();
                    running.sort_by(|a, b| a.trip.code.cmp(&b.trip.code));
                    if let Some(as_of) = snapshot.as_of {
                        println!("-- {as_of} --");
                    }
                    for trip in running {
                        render::trip_line(&engine, &trip.trip, &trip.state);
                    }
                }
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = snapshots.changed() => if changed.is_err() { break },
                }
            }
        }
    }

    live.shutdown().await;
    Ok(())
}
