//! The tick task and the handle used to talk to it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use wsr_timetable::{ClockTime, DepartureBoard, StationCode, TimetableEngine, TimetableError, TripCode, TripUpdate};

use crate::clock::QueryClock;
use crate::snapshot::{Snapshot, TripSnapshot};
use crate::subscription::{Registry, Subscription};

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("Live timetable has stopped")]
    Closed,

    #[error(transparent)]
    Timetable(#[from] TimetableError),
}

pub type Result<T> = std::result::Result<T, LiveError>;

#[derive(Clone, Debug)]
pub struct LiveConfig {
    pub tick_interval: Duration,
    /// Buffered updates per subscriber before new ones are dropped
    pub channel_capacity: usize,
    pub board_limit: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
            channel_capacity: 16,
            board_limit: 10,
        }
    }
}

pub type TripSubscription = Subscription<TripCode, Arc<TripSnapshot>>;
pub type StationSubscription = Subscription<StationCode, Arc<DepartureBoard>>;

enum Command {
    Update {
        trip: TripCode,
        update: TripUpdate,
        reply: oneshot::Sender<wsr_timetable::Result<()>>,
    },
    Refresh {
        reply: oneshot::Sender<Arc<Snapshot>>,
    },
}

pub struct LiveTimetable;

const MIN_TICK: Duration = Duration::from_millis(1);

impl LiveTimetable {
    /// Start the tick task on the current tokio runtime.
    ///
    /// The first snapshot is computed before this returns. A zero tick
    /// interval is raised to one millisecond.
    pub fn spawn(engine: TimetableEngine, clock: Arc<dyn QueryClock>, config: LiveConfig) -> LiveHandle {
        let trips = Registry::new(config.channel_capacity);
        let boards = Registry::new(config.channel_capacity);

        let initial = Snapshot::compute(&engine, clock.now(), config.board_limit);
        let (latest_tx, latest_rx) = watch::channel(Arc::new(initial));
        let (command_tx, command_rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = LiveTask {
            engine,
            clock,
            trips: trips.clone(),
            boards: boards.clone(),
            latest: latest_tx,
            board_limit: config.board_limit,
        };
        let period = config.tick_interval.max(MIN_TICK);
        let join = tokio::spawn(task.run(period, command_rx, shutdown_rx));

        LiveHandle {
            commands: command_tx,
            latest: latest_rx,
            trips,
            boards,
            shutdown_tx: Some(shutdown_tx),
            join: Some(join),
        }
    }
}

struct LiveTask {
    engine: TimetableEngine,
    clock: Arc<dyn QueryClock>,
    trips: Arc<Registry<TripCode, Arc<TripSnapshot>>>,
    boards: Arc<Registry<StationCode, Arc<DepartureBoard>>>,
    latest: watch::Sender<Arc<Snapshot>>,
    board_limit: usize,
}

impl LiveTask {
    async fn run(
        mut self,
        period: Duration,
        mut commands: mpsc::Receiver<Command>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        tracing::info!(?period, "live timetable started");

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.publish();
                }
                command = commands.recv() => match command {
                    Some(Command::Update { trip, update, reply }) => {
                        let result = self.engine.apply_update(&trip, update, self.clock.now());
                        if result.is_ok() {
                            self.publish();
                        }
                        let _ = reply.send(result);
                    }
                    Some(Command::Refresh { reply }) => {
                        let _ = reply.send(self.publish());
                    }
                    None => break,
                },
            }
        }

        tracing::info!("live timetable stopped");
    }

    fn publish(&mut self) -> Arc<Snapshot> {
        let query = self.clock.now();
        let snapshot = Arc::new(Snapshot::compute(&self.engine, query, self.board_limit));
        tracing::debug!(%query, running = snapshot.running().count(), "publishing snapshot");

        for (code, trip) in &snapshot.trips {
            self.trips.publish(code, trip);
        }
        for (code, board) in &snapshot.boards {
            self.boards.publish(code, board);
        }

        self.latest.send_replace(snapshot.clone());
        snapshot
    }
}

/// Owner of a running live timetable.
///
/// Dropping the handle stops the task.
pub struct LiveHandle {
    commands: mpsc::Sender<Command>,
    latest: watch::Receiver<Arc<Snapshot>>,
    trips: Arc<Registry<TripCode, Arc<TripSnapshot>>>,
    boards: Arc<Registry<StationCode, Arc<DepartureBoard>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl LiveHandle {
    pub fn subscribe_trip(&self, trip: TripCode) -> TripSubscription {
        self.trips.subscribe(trip)
    }

    pub fn subscribe_station(&self, station: StationCode) -> StationSubscription {
        self.boards.subscribe(station)
    }

    pub fn subscriber_count(&self) -> usize {
        self.trips.len() + self.boards.len()
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        self.latest.borrow().clone()
    }

    /// Query time of the latest snapshot
    pub fn as_of(&self) -> Option<ClockTime> {
        self.latest.borrow().as_of
    }

    /// A receiver that wakes on every new snapshot
    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.latest.clone()
    }

    /// Apply a status update and republish straight away
    pub async fn apply_update(&self, trip: TripCode, update: TripUpdate) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Update { trip, update, reply })
            .await
            .map_err(|_| LiveError::Closed)?;
        response.await.map_err(|_| LiveError::Closed)??;
        Ok(())
    }

    /// Republish without waiting for the next tick
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Refresh { reply })
            .await
            .map_err(|_| LiveError::Closed)?;
        response.await.map_err(|_| LiveError::Closed)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            if let Err(error) = join.await {
                tracing::warn!(%error, "live timetable task failed");
            }
        }
    }
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use wsr_timetable::{sample, TripLifecycle, TripLocation};

    fn engine() -> TimetableEngine {
        TimetableEngine::new(Arc::new(sample::west_somerset().unwrap()))
    }

    fn start(at: ClockTime) -> (LiveHandle, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(at));
        let handle = LiveTimetable::spawn(engine(), clock.clone(), LiveConfig::default());
        (handle, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_snapshot() {
        let (handle, _clock) = start(ClockTime::at(10, 20));
        let snapshot = handle.latest();
        assert_eq!(handle.as_of(), Some(ClockTime::at(10, 20)));
        assert_eq!(
            snapshot.trip(&"1S01".into()).unwrap().state.location,
            Some(TripLocation::Between("BL".into(), "CH".into()))
        );
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_publishes_to_trip_subscriber() {
        let (handle, clock) = start(ClockTime::at(10, 20));
        let mut subscription = handle.subscribe_trip("1S01".into());

        clock.set(ClockTime::at(10, 28));
        let update = subscription.recv().await.unwrap();
        assert_eq!(update.state.as_of, ClockTime::at(10, 28));
        assert_eq!(
            update.state.location,
            Some(TripLocation::Between("CH".into(), "STO".into()))
        );
        assert_eq!(handle.as_of(), Some(ClockTime::at(10, 28)));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_interval() {
        let (handle, clock) = start(ClockTime::at(11, 0));
        let mut watch = handle.watch();

        let started = Instant::now();
        clock.set(ClockTime::at(11, 1));
        watch.changed().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(30));
        assert_eq!(watch.borrow().as_of, Some(ClockTime::at(11, 1)));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_republishes_immediately() {
        let (handle, _clock) = start(ClockTime::at(12, 0));
        let mut board = handle.subscribe_station("MIN".into());

        let started = Instant::now();
        handle
            .apply_update("2S06".into(), TripUpdate::Delay { minutes: 5, message: None })
            .await
            .unwrap();

        let update = board.recv().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(30));
        let entry = update.departures.iter().find(|e| e.trip.as_str() == "2S06").unwrap();
        assert_eq!(entry.status, "Exp 5 min late");

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_update() {
        let (handle, _clock) = start(ClockTime::at(12, 0));
        let result = handle
            .apply_update("9Z99".into(), TripUpdate::Cancellation { reason: None })
            .await;
        assert!(matches!(
            result,
            Err(LiveError::Timetable(TimetableError::TripNotFound(_)))
        ));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_and_cancellation() {
        let (handle, clock) = start(ClockTime::at(10, 20));
        handle
            .apply_update("1S01".into(), TripUpdate::Cancellation { reason: Some("Fire risk".into()) })
            .await
            .unwrap();

        clock.set(ClockTime::at(10, 40));
        let snapshot = handle.refresh().await.unwrap();
        let trip = snapshot.trip(&"1S01".into()).unwrap();
        assert_eq!(trip.state.lifecycle, TripLifecycle::Cancelled);
        assert_eq!(trip.state.location, None);
        assert_eq!(trip.status.message.as_deref(), Some("Fire risk"));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe() {
        let (handle, _clock) = start(ClockTime::at(10, 20));
        let trip = handle.subscribe_trip("1S01".into());
        let station = handle.subscribe_station("BL".into());
        assert_eq!(handle.subscriber_count(), 2);

        trip.unsubscribe();
        drop(station);
        assert_eq!(handle.subscriber_count(), 0);
        handle.refresh().await.unwrap();

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let clock = Arc::new(ManualClock::new(ClockTime::at(10, 20)));
        let config = LiveConfig {
            tick_interval: Duration::ZERO,
            ..LiveConfig::default()
        };
        let handle = LiveTimetable::spawn(engine(), clock.clone(), config);
        let mut subscription = handle.subscribe_trip("1S01".into());

        clock.set(ClockTime::at(10, 28));
        let update = subscription.recv().await.unwrap();
        assert_eq!(update.state.as_of, ClockTime::at(10, 28));
        assert!(handle.refresh().await.is_ok());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_subscriptions() {
        let (handle, _clock) = start(ClockTime::at(10, 20));
        let mut subscription = handle.subscribe_station("WIL".into());
        handle.shutdown().await;
        assert!(subscription.recv().await.is_none());
    }
}
