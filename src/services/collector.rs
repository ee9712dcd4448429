// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking session: the single-writer collector and its checkpoint writer.
//!
//! Sensor events are delivered to one background task that exclusively owns
//! the step detector, the distance accumulator and the running totals. Readers
//! only ever see copies published through the [`SessionContext`].
//!
//! Persistence happens on a second task so a slow store never stalls event
//! processing. The queue between them holds one record: a checkpoint that
//! fires while a write is still pending is dropped. The flush on stop waits
//! for queue space and is always the last write of the session.
//!
//! Totals belong to one local calendar day. When the clock passes midnight
//! the collector flushes the finished day and counts on from zero.

use crate::config::TrackerSettings;
use crate::db::Database;
use crate::error::AppError;
use crate::models::{DailyRecord, SensorEvent, TotalsSnapshot};
use crate::services::achievements::AchievementService;
use crate::services::aggregator::DailyAggregator;
use crate::services::distance::DistanceAccumulator;
use crate::services::notifier::{Notifier, TrackerNotification};
use crate::services::session::SessionContext;
use crate::services::step_detector::StepDetector;
use crate::time_utils::{date_key, local_date, local_day_start};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

/// Source of "now" for the tracking pipeline.
pub type Clock = fn() -> DateTime<Utc>;

/// Pending sensor batches accepted before `feed` waits.
const COMMAND_QUEUE_DEPTH: usize = 64;

enum Command {
    Events {
        events: Vec<SensorEvent>,
        reply: oneshot::Sender<TotalsSnapshot>,
    },
    Stop {
        reply: oneshot::Sender<TotalsSnapshot>,
    },
}

/// Channel to a running collector task.
struct TrackingHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

/// Starts, feeds and stops tracking sessions.
pub struct TrackingService {
    db: Database,
    session: SessionContext,
    notifier: Notifier,
    achievements: AchievementService,
    settings: TrackerSettings,
    clock: Clock,
    active: Mutex<Option<TrackingHandle>>,
}

impl TrackingService {
    pub fn new(
        db: Database,
        session: SessionContext,
        notifier: Notifier,
        settings: TrackerSettings,
    ) -> Self {
        let achievements = AchievementService::new(db.clone(), notifier.clone());
        Self {
            db,
            session,
            notifier,
            achievements,
            settings,
            clock: Utc::now,
            active: Mutex::new(None),
        }
    }

    /// Use a fixed or simulated clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the tracker's clock.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub async fn is_running(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Refresh the session streak and unlock earned achievements for `user_id`.
    pub async fn refresh_progress(&self, user_id: u64) {
        refresh_progress(&self.achievements, &self.session, user_id, self.clock).await;
    }

    /// Start a session for whoever is signed in.
    ///
    /// A signed-in user resumes from today's persisted record so the first
    /// checkpoint does not overwrite earlier progress. Guests start at zero.
    pub async fn start(&self) -> Result<TotalsSnapshot, AppError> {
        if !self.session.is_active() {
            return Err(AppError::Unauthorized);
        }

        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(AppError::Conflict("Tracking already active".to_string()));
        }

        let now = (self.clock)();
        let user_id = self.session.user_id();
        let weight_kg = self.session.weight_kg();

        let mut aggregator = DailyAggregator::new(now, self.settings.checkpoint_every_steps);
        if let Some(user_id) = user_id {
            let today = date_key(now);
            match self.db.get_daily_record(user_id, &today).await {
                Ok(Some(record)) => {
                    tracing::debug!(user_id, date = %today, steps = record.steps, "Resuming today's totals");
                    aggregator = aggregator.resume(&record, weight_kg);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Could not load today's record; starting from zero");
                }
            }
        }

        let distance = DistanceAccumulator::new(
            self.settings.max_fix_accuracy_m,
            self.settings.min_distance_delta_m,
        )
        .with_total(aggregator.totals().distance_m);

        // Guests never persist, so they get no writer.
        let (checkpoints, writer) = match user_id {
            Some(_) => {
                let (tx, rx) = mpsc::channel(1);
                let writer = tokio::spawn(run_writer(
                    rx,
                    self.db.clone(),
                    self.achievements.clone(),
                    self.session.clone(),
                    self.clock,
                ));
                (Some(tx), Some(writer))
            }
            None => (None, None),
        };

        let collector = Collector {
            user_id,
            weight_kg,
            detector: StepDetector::new(self.settings.detector.clone()),
            distance,
            aggregator,
            session: self.session.clone(),
            notifier: self.notifier.clone(),
            checkpoints,
            writer,
            clock: self.clock,
        };

        let snapshot = collector.snapshot(true);
        self.session.mark_tracking_started(now);
        collector.publish(snapshot.clone());

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let task = tokio::spawn(collector.run(rx));
        *active = Some(TrackingHandle { commands: tx, task });

        tracing::info!(
            user_id = ?user_id,
            steps = snapshot.steps,
            "Tracking started"
        );
        Ok(snapshot)
    }

    /// Deliver a batch of sensor events and wait until they are applied.
    pub async fn feed(&self, events: Vec<SensorEvent>) -> Result<TotalsSnapshot, AppError> {
        let commands = match self.active.lock().await.as_ref() {
            Some(handle) => handle.commands.clone(),
            None => return Err(AppError::BadRequest("Tracking is not active".to_string())),
        };

        let (reply, response) = oneshot::channel();
        commands
            .send(Command::Events { events, reply })
            .await
            .map_err(|_| anyhow::anyhow!("Collector task is gone"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Collector dropped the batch").into())
    }

    /// Stop the session: flush once, then discard detector state.
    ///
    /// The session lock is held until the final write has landed, so a
    /// concurrent `start` resumes from the flushed record.
    /// Returns `None` when no session was running.
    pub async fn stop(&self) -> Result<Option<TotalsSnapshot>, AppError> {
        let mut active = self.active.lock().await;
        let Some(handle) = active.take() else {
            return Ok(None);
        };

        let (reply, response) = oneshot::channel();
        if handle.commands.send(Command::Stop { reply }).await.is_err() {
            return Err(anyhow::anyhow!("Collector task is gone").into());
        }
        let snapshot = response
            .await
            .map_err(|_| anyhow::anyhow!("Collector stopped without a final snapshot"))?;

        if let Err(e) = handle.task.await {
            tracing::error!(error = %e, "Collector task panicked");
        }

        self.session.mark_tracking_stopped();
        drop(active);

        tracing::info!(
            user_id = ?snapshot.user_id,
            steps = snapshot.steps,
            distance_m = snapshot.distance_m,
            "Tracking stopped"
        );
        Ok(Some(snapshot))
    }
}

/// Owns all mutable tracking state for one session.
struct Collector {
    user_id: Option<u64>,
    weight_kg: f64,
    detector: StepDetector,
    distance: DistanceAccumulator,
    aggregator: DailyAggregator,
    session: SessionContext,
    notifier: Notifier,
    checkpoints: Option<mpsc::Sender<DailyRecord>>,
    writer: Option<JoinHandle<()>>,
    clock: Clock,
}

impl Collector {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Events { events, reply } => {
                    self.roll_over().await;
                    for event in &events {
                        self.apply(event);
                    }
                    let snapshot = self.snapshot(true);
                    self.publish(snapshot.clone());
                    let _ = reply.send(snapshot);
                }
                Command::Stop { reply } => {
                    let snapshot = self.finish().await;
                    let _ = reply.send(snapshot);
                    return;
                }
            }
        }

        // Every handle dropped without a stop: still flush.
        self.finish().await;
    }

    fn apply(&mut self, event: &SensorEvent) {
        match event {
            SensorEvent::Accelerometer(sample) => {
                if self.detector.on_sample(sample).is_none() {
                    return;
                }
                let outcome = self.aggregator.record_step(self.weight_kg);
                if outcome.checkpoint_due {
                    self.checkpoint();
                }
            }
            SensorEvent::Location(fix) => {
                if let Some(delta) = self.distance.on_location_fix(fix) {
                    self.aggregator.add_distance(delta);
                }
            }
        }
    }

    /// Queue a checkpoint without waiting.
    fn checkpoint(&self) {
        let (Some(user_id), Some(tx)) = (self.user_id, &self.checkpoints) else {
            return;
        };
        let record = self.aggregator.to_record(user_id, (self.clock)());
        let steps = record.steps;
        match tx.try_send(record) {
            Ok(()) => tracing::debug!(user_id, steps, "Checkpoint queued"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(user_id, steps, "Write still pending; checkpoint dropped")
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(user_id, steps, "Checkpoint writer has exited")
            }
        }
    }

    /// Close out the previous day once the clock has passed midnight.
    async fn roll_over(&mut self) {
        let now = (self.clock)();
        if !self.aggregator.is_past_day(now) {
            return;
        }

        let finished = self.aggregator.day();
        let day_end = finished
            .succ_opt()
            .and_then(local_day_start)
            .map_or(now, |end| end.min(now));
        if let (Some(user_id), Some(tx)) = (self.user_id, &self.checkpoints) {
            let record = self.aggregator.to_record(user_id, day_end);
            if tx.send(record).await.is_err() {
                tracing::warn!(user_id, date = %finished, "Checkpoint writer has exited; day flush lost");
            }
        }

        tracing::info!(
            user_id = ?self.user_id,
            date = %finished,
            steps = self.aggregator.totals().steps,
            "Day finished; totals start over"
        );
        let day_start = local_day_start(local_date(now)).unwrap_or(now);
        self.aggregator.reset(day_start);
    }

    /// Final flush, then wait for the writer to drain.
    async fn finish(&mut self) -> TotalsSnapshot {
        self.roll_over().await;
        if let (Some(user_id), Some(tx)) = (self.user_id, self.checkpoints.take()) {
            let record = self.aggregator.to_record(user_id, (self.clock)());
            if tx.send(record).await.is_err() {
                tracing::warn!(user_id, "Checkpoint writer has exited; final flush lost");
            }
        }
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.await {
                tracing::error!(error = %e, "Checkpoint writer panicked");
            }
        }

        self.detector.reset();
        self.distance.reset();

        let snapshot = self.snapshot(false);
        self.publish(snapshot.clone());
        snapshot
    }

    fn snapshot(&self, tracking: bool) -> TotalsSnapshot {
        self.aggregator
            .snapshot(self.user_id, (self.clock)(), tracking)
    }

    fn publish(&self, snapshot: TotalsSnapshot) {
        // A different user may have signed in; leave their totals alone.
        if self.session.user_id() != self.user_id {
            return;
        }
        self.session.publish(snapshot.clone());
        self.notifier
            .notify(TrackerNotification::TotalsUpdated(snapshot));
    }
}

/// Persist checkpoints one at a time. Failures are logged and not retried.
async fn run_writer(
    mut records: mpsc::Receiver<DailyRecord>,
    db: Database,
    achievements: AchievementService,
    session: SessionContext,
    clock: Clock,
) {
    while let Some(record) = records.recv().await {
        let user_id = record.user_id;
        match db.upsert_daily_record(&record).await {
            Ok(()) => {
                tracing::debug!(user_id, date = %record.date, steps = record.steps, "Checkpoint written");
                refresh_progress(&achievements, &session, user_id, clock).await;
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    date = %record.date,
                    steps = record.steps,
                    error = %e,
                    "Checkpoint write failed; keeping in-memory totals"
                );
            }
        }
    }
}

/// Refresh the streak and unlock anything newly earned.
///
/// Errors are logged; progress tracking never fails a session.
pub async fn refresh_progress(
    achievements: &AchievementService,
    session: &SessionContext,
    user_id: u64,
    clock: Clock,
) {
    let today = local_date(clock());
    let streak = match achievements.load_streak(user_id, today).await {
        Ok(streak) => streak,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Streak refresh failed");
            session.current_streak()
        }
    };
    if session.user_id() == Some(user_id) {
        session.set_current_streak(streak);
    }

    if let Err(e) = achievements.check_and_unlock(user_id, streak).await {
        tracing::warn!(user_id, error = %e, "Achievement check failed");
    }
}
