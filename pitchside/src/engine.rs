//! The engine that runs a match and keeps every display in sync.
//!
//! `MatchEngine` is the central point of control: it owns the match state,
//! the break timer and the display registry, drives the one-per-second tick
//! and fans every resulting snapshot out over broadcast channels. The
//! engine is designed to be cloned and shared across tasks, providing a
//! handle to the running instance.
//!
//! Concurrency model: all mutations funnel through this handle; the
//! broadcast sends never block, so a slow or vanished display can never
//! stall the control process.

use crate::clock::{self, ClockRules, Effect, PhaseStart, Trigger};
use crate::common::DisplayId;
use crate::components::display::DisplayFeed;
use crate::components::timeout::TimeoutTimer;
use crate::config::{MatchConfig, ScoreboardStyle};
use crate::events::EngineEvent;
use crate::state::{MatchPhase, MatchState, PenaltyKick, StatePatch, TeamSide};
use crate::time::{SystemClock, TickEvent, TICK_PERIOD};
use chrono::{DateTime, Utc};
use slotmap::SlotMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, trace};

/// Bookkeeping for one attached display window.
#[derive(Debug, Clone)]
pub struct DisplayInfo {
    pub label: String,
    pub attached_at: DateTime<Utc>,
}

/// The match scoreboard engine.
#[derive(Clone)]
pub struct MatchEngine {
    config_path: Option<PathBuf>,
    config: Arc<RwLock<MatchConfig>>,
    state: Arc<RwLock<MatchState>>,
    timeout: Arc<RwLock<TimeoutTimer>>,
    displays: Arc<RwLock<SlotMap<DisplayId, DisplayInfo>>>,
    /// The at-most-one ticking interval: set while the match clock advances.
    ticking: Arc<AtomicBool>,
    tick_sender: broadcast::Sender<Arc<TickEvent>>,
    snapshot_sender: broadcast::Sender<Arc<MatchState>>,
    timeout_sender: broadcast::Sender<u32>,
    config_sender: broadcast::Sender<MatchConfig>,
    style_sender: broadcast::Sender<ScoreboardStyle>,
    event_sender: broadcast::Sender<EngineEvent>,
}

// Core implementation block for internal logic.
impl MatchEngine {
    /// Creates an engine for the given fixture.
    pub fn new(config: MatchConfig) -> Self {
        const CHANNEL_CAPACITY: usize = 256;
        let (tick_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (snapshot_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (timeout_sender, _) = broadcast::channel(64);
        let (config_sender, _) = broadcast::channel(64);
        let (style_sender, _) = broadcast::channel(64);
        let (event_sender, _) = broadcast::channel(64);

        let state = MatchState::from_config(&config);

        Self {
            config_path: None,
            config: Arc::new(RwLock::new(config)),
            state: Arc::new(RwLock::new(state)),
            timeout: Arc::new(RwLock::new(TimeoutTimer::default())),
            displays: Arc::new(RwLock::new(SlotMap::with_key())),
            ticking: Arc::new(AtomicBool::new(false)),
            tick_sender,
            snapshot_sender,
            timeout_sender,
            config_sender,
            style_sender,
            event_sender,
        }
    }

    /// Creates an engine whose fixture lives in a TOML file. The file is
    /// re-read on every match reset; a broken file falls back to defaults.
    pub fn with_config_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = MatchConfig::load(&path);
        let mut engine = Self::new(config);
        engine.config_path = Some(path);
        engine
    }

    /// Runs the engine's main loop until a shutdown signal is received.
    ///
    /// This method will:
    /// 1. Spawn the `SystemClock` task ticking once per second.
    /// 2. Spawn the dispatcher task that advances the match and break timers.
    /// 3. Wait for a Ctrl+C signal to initiate a graceful shutdown.
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("MatchEngine starting up...");
        let (shutdown_tx, _) = broadcast::channel(1);

        let clock = SystemClock::new(TICK_PERIOD, self.tick_sender.clone());
        let clock_shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move { clock.run(clock_shutdown_rx).await });

        let dispatcher = self.clone();
        let dispatcher_shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move { dispatcher.dispatcher_loop(dispatcher_shutdown_rx).await });

        info!("Engine running. Press Ctrl+C to shut down.");
        tokio::signal::ctrl_c().await?;

        info!("Shutdown signal received. Broadcasting to all tasks...");
        if shutdown_tx.send(()).is_err() {
            error!("Failed to send shutdown signal. Some tasks may not terminate gracefully.");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.event_sender.send(EngineEvent::EngineShutdown).ok();
        info!("MatchEngine has shut down.");
        Ok(())
    }

    #[doc(hidden)]
    async fn dispatcher_loop(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut tick_rx = self.tick_sender.subscribe();
        self.event_sender
            .send(EngineEvent::EngineStarted { at: Utc::now() })
            .ok();
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                Ok(tick) = tick_rx.recv() => {
                    trace!("Tick #{} received.", tick.tick_count);
                    self.on_master_tick().await;
                }
            }
        }
    }

    /// One step of the dispatcher: advance the match clock if it is armed,
    /// then the break timer if it is running.
    async fn on_master_tick(&self) {
        if self.ticking.load(Ordering::SeqCst) {
            self.tick(1).await;
        }
        let elapsed = {
            let mut timeout = self.timeout.write().await;
            timeout.running.then(|| timeout.advance())
        };
        if let Some(elapsed) = elapsed {
            self.timeout_sender.send(elapsed).ok();
        }
    }

    /// Arms the ticking interval. Returns silently if it is already armed,
    /// so at most one interval ever advances the clock.
    fn arm_clock(&self) {
        if !self.ticking.swap(true, Ordering::SeqCst) {
            self.event_sender.send(EngineEvent::ClockStarted).ok();
        }
    }

    fn stop_clock(&self) {
        if self.ticking.swap(false, Ordering::SeqCst) {
            self.event_sender.send(EngineEvent::ClockStopped).ok();
        }
    }

    /// Applies a clock trigger to the state and carries out its effects.
    async fn apply_trigger(&self, trigger: Trigger) {
        let rules = ClockRules::from(&*self.config.read().await);
        let (snapshot, prev_phase) = {
            let mut state = self.state.write().await;
            let prev_phase = state.phase;
            let effects = clock::advance(&mut state, trigger, &rules);
            let snapshot = Arc::new(state.clone());
            drop(state);
            for effect in effects {
                match effect {
                    Effect::StartClock => self.arm_clock(),
                    Effect::StopClock => self.stop_clock(),
                    Effect::Publish => {}
                }
            }
            (snapshot, prev_phase)
        };
        self.publish_snapshot(snapshot, prev_phase).await;
    }

    /// Runs a direct state mutation and publishes the resulting snapshot.
    async fn mutate_state(&self, mutate: impl FnOnce(&mut MatchState)) {
        let (snapshot, prev_phase) = {
            let mut state = self.state.write().await;
            let prev_phase = state.phase;
            mutate(&mut state);
            (Arc::new(state.clone()), prev_phase)
        };
        self.publish_snapshot(snapshot, prev_phase).await;
    }

    /// Fans a snapshot out to every display, unconditionally. Entering a
    /// break phase restarts the break timer for the displays.
    async fn publish_snapshot(&self, snapshot: Arc<MatchState>, prev_phase: MatchPhase) {
        let phase = snapshot.phase;
        self.snapshot_sender.send(snapshot).ok();
        if phase != prev_phase {
            self.event_sender
                .send(EngineEvent::PhaseChanged {
                    from: prev_phase,
                    to: phase,
                })
                .ok();
            if phase.starts_break() {
                self.timeout.write().await.start();
                self.timeout_sender.send(0).ok();
            }
        }
    }
}

// Public operator API.
impl MatchEngine {
    /// Begins advancing the match clock by one second per real-time second.
    /// A second call while the clock is already running is a silent no-op.
    pub fn start_clock(&self) {
        self.arm_clock();
    }

    /// Stops the clock. Idempotent; this is the sole cancellation mechanism
    /// for the ticking interval.
    pub fn pause_clock(&self) {
        self.stop_clock();
    }

    /// Resumes the clock, unless it sits exactly on a phase boundary; those
    /// are advanced by the explicit phase-start actions instead.
    pub async fn resume_clock(&self) {
        if clock::at_phase_boundary(&*self.state.read().await) {
            return;
        }
        self.arm_clock();
    }

    /// Advances the clock, applying ceiling clamps and automatic phase
    /// transitions. Called once per second while running; also the
    /// implementation of manual time additions.
    pub async fn tick(&self, seconds: u32) {
        self.apply_trigger(Trigger::Tick { seconds }).await;
    }

    /// Manual "add time", subject to the same rules as automatic ticking.
    pub async fn add_time(&self, seconds: u32) {
        self.tick(seconds).await;
    }

    /// Cosmetic correction backwards, floored at zero. Never triggers a
    /// phase change.
    pub async fn subtract_time(&self, seconds: u32) {
        self.apply_trigger(Trigger::Subtract { seconds }).await;
    }

    /// Stops the clock, re-reads the fixture from the configuration
    /// collaborator and reinitializes the match.
    pub async fn reset_match(&self) {
        let config = match &self.config_path {
            Some(path) => {
                let loaded = MatchConfig::load(path);
                *self.config.write().await = loaded.clone();
                loaded
            }
            None => self.config.read().await.clone(),
        };
        self.apply_trigger(Trigger::Reset(config)).await;
    }

    /// Explicit operator phase start: sets the timer window and phase, then
    /// arms the clock (except for penalties).
    pub async fn start_phase(&self, start: PhaseStart) {
        self.apply_trigger(Trigger::StartPhase(start)).await;
    }

    pub async fn start_first_half(&self) {
        self.start_phase(PhaseStart::first_half()).await;
    }

    pub async fn start_second_half(&self) {
        self.start_phase(PhaseStart::second_half()).await;
    }

    /// Only meaningful when the second half ended level; the panel gates the
    /// action on that condition.
    pub async fn start_extra_time_first(&self) {
        self.start_phase(PhaseStart::extra_time_first()).await;
    }

    pub async fn start_extra_time_second(&self) {
        self.start_phase(PhaseStart::extra_time_second()).await;
    }

    pub async fn start_penalties(&self) {
        self.start_phase(PhaseStart::penalties()).await;
    }

    /// Adjusts a team's score; clamped at zero.
    pub async fn change_score(&self, side: TeamSide, delta: i32) {
        self.mutate_state(|state| state.change_score(side, delta)).await;
    }

    /// Announces stoppage minutes for the end of the second half.
    pub async fn set_stoppage_time(&self, minutes: u32) {
        self.mutate_state(|state| state.set_stoppage_time(minutes)).await;
    }

    /// Merges a partial operator update into the match state.
    pub async fn apply_patch(&self, patch: StatePatch) {
        self.mutate_state(|state| state.apply(patch)).await;
    }

    pub async fn push_kick(&self, side: TeamSide, kick: PenaltyKick) {
        self.mutate_state(|state| state.push_kick(side, kick)).await;
    }

    pub async fn undo_kick(&self, side: TeamSide) {
        self.mutate_state(|state| state.undo_kick(side)).await;
    }

    pub async fn toggle_kick(&self, side: TeamSide, index: usize) {
        self.mutate_state(|state| state.toggle_kick(side, index)).await;
    }
}

// Break timer, queries, configuration and display management.
impl MatchEngine {
    /// Restarts the break timer from zero and announces it.
    pub async fn timeout_start(&self) {
        self.timeout.write().await.start();
        self.timeout_sender.send(0).ok();
    }

    pub async fn timeout_pause(&self) {
        self.timeout.write().await.pause();
    }

    pub async fn timeout_reset(&self) {
        self.timeout.write().await.reset();
        self.timeout_sender.send(0).ok();
    }

    /// Sets the target break length; out-of-range input is clamped.
    pub async fn set_timeout_duration(&self, minutes: u32, seconds: u32) {
        self.timeout.write().await.set_duration(minutes, seconds);
    }

    /// Answers a display's pull for the current break timer value.
    pub async fn timeout_value(&self) -> u32 {
        self.timeout.read().await.elapsed
    }

    /// Point-in-time snapshot for late joiners; the stream does not replay.
    pub async fn snapshot(&self) -> Arc<MatchState> {
        Arc::new(self.state.read().await.clone())
    }

    /// The active fixture configuration, for display bootstrap.
    pub async fn current_config(&self) -> MatchConfig {
        self.config.read().await.clone()
    }

    /// Persists the fixture (when a config file is attached) and rebroadcasts
    /// it to every subscriber.
    pub async fn save_config(&self, config: MatchConfig) -> anyhow::Result<()> {
        if let Some(path) = &self.config_path {
            config.save(path)?;
        }
        *self.config.write().await = config.clone();
        self.style_sender.send(config.style.clone()).ok();
        self.config_sender.send(config).ok();
        self.event_sender.send(EngineEvent::ConfigSaved).ok();
        Ok(())
    }

    /// Pushes a styling change to the displays without persisting it.
    pub async fn set_style(&self, style: ScoreboardStyle) {
        self.config.write().await.style = style.clone();
        self.style_sender.send(style).ok();
    }

    /// Registers a display window and hands it everything it needs to
    /// render: the current snapshot and configuration plus the live streams.
    pub async fn attach_display(&self, label: impl Into<String>) -> (DisplayId, DisplayFeed) {
        let info = DisplayInfo {
            label: label.into(),
            attached_at: Utc::now(),
        };
        let id = self.displays.write().await.insert(info);
        self.event_sender
            .send(EngineEvent::DisplayAttached { id })
            .ok();
        let feed = DisplayFeed {
            snapshot: self.snapshot().await,
            config: self.current_config().await,
            updates: self.snapshot_sender.subscribe(),
            timeout: self.timeout_sender.subscribe(),
            config_updates: self.config_sender.subscribe(),
            style: self.style_sender.subscribe(),
        };
        (id, feed)
    }

    /// Removes a display from the registry. Its receivers keep draining
    /// until dropped; publishing never notices.
    ///
    /// Returns `true` if the display was found and removed.
    pub async fn close_display(&self, id: DisplayId) -> bool {
        let was_removed = self.displays.write().await.remove(id).is_some();
        if was_removed {
            self.event_sender
                .send(EngineEvent::DisplayClosed { id })
                .ok();
        }
        was_removed
    }

    /// The currently attached displays.
    pub async fn displays(&self) -> Vec<(DisplayId, DisplayInfo)> {
        self.displays
            .read()
            .await
            .iter()
            .map(|(id, info)| (id, info.clone()))
            .collect()
    }

    /// Subscribes to the scoreboard snapshot stream.
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<Arc<MatchState>> {
        self.snapshot_sender.subscribe()
    }

    /// Subscribes to the break timer stream.
    pub fn subscribe_timeout(&self) -> broadcast::Receiver<u32> {
        self.timeout_sender.subscribe()
    }

    /// Subscribes to the `EngineEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_sender.subscribe()
    }

    /// Subscribes to fixture configuration reloads.
    pub fn subscribe_config(&self) -> broadcast::Receiver<MatchConfig> {
        self.config_sender.subscribe()
    }

    /// Subscribes to styling pushes.
    pub fn subscribe_style(&self) -> broadcast::Receiver<ScoreboardStyle> {
        self.style_sender.subscribe()
    }

    /// Subscribes to the raw master tick stream.
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<Arc<TickEvent>> {
        self.tick_sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FULLTIME_SECS, HALFTIME_SECS};
    use crate::state::MatchKind;
    use tokio::sync::broadcast::error::TryRecvError;

    fn knockout_engine() -> MatchEngine {
        MatchEngine::new(MatchConfig {
            kind: MatchKind::Knockout,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn double_start_advances_exactly_once_per_tick() {
        let engine = MatchEngine::new(MatchConfig::default());
        engine.start_first_half().await;
        engine.start_clock();
        engine.start_clock(); // second start: silent no-op

        engine.on_master_tick().await;
        assert_eq!(engine.snapshot().await.timer, 1);
    }

    #[tokio::test]
    async fn clock_does_not_advance_until_started() {
        let engine = MatchEngine::new(MatchConfig::default());
        engine.on_master_tick().await;
        engine.on_master_tick().await;
        assert_eq!(engine.snapshot().await.timer, 0);
    }

    #[tokio::test]
    async fn resume_is_refused_on_phase_boundaries() {
        let engine = MatchEngine::new(MatchConfig::default());
        // First half at 00:00 is a boundary: resume must not arm the clock.
        engine.resume_clock().await;
        engine.on_master_tick().await;
        assert_eq!(engine.snapshot().await.timer, 0);

        // Off the boundary, resume works.
        engine.add_time(10).await;
        engine.resume_clock().await;
        engine.on_master_tick().await;
        assert_eq!(engine.snapshot().await.timer, 11);
    }

    #[tokio::test]
    async fn halftime_transition_stops_the_clock() {
        let engine = MatchEngine::new(MatchConfig::default());
        engine.start_first_half().await;
        engine.add_time(2699).await;

        engine.on_master_tick().await;
        let snap = engine.snapshot().await;
        assert_eq!(snap.phase, MatchPhase::Halftime);
        assert_eq!(snap.timer, HALFTIME_SECS);

        // The interval is gone: further master ticks change nothing.
        engine.on_master_tick().await;
        assert_eq!(engine.snapshot().await.timer, HALFTIME_SECS);
    }

    #[tokio::test]
    async fn every_mutation_publishes_a_snapshot_in_order() {
        let engine = MatchEngine::new(MatchConfig::default());
        let mut updates = engine.subscribe_snapshots();

        engine.change_score(TeamSide::Home, 1).await;
        engine.change_score(TeamSide::Home, 1).await;
        engine.subtract_time(5).await;

        assert_eq!(updates.recv().await.unwrap().home.score, 1);
        assert_eq!(updates.recv().await.unwrap().home.score, 2);
        let third = updates.recv().await.unwrap();
        assert_eq!(third.home.score, 2);
        assert_eq!(third.timer, 0);
    }

    #[tokio::test]
    async fn break_timer_autostarts_when_a_break_phase_begins() {
        let engine = MatchEngine::new(MatchConfig::default());
        let mut timeout_rx = engine.subscribe_timeout();

        engine.start_first_half().await;
        engine.add_time(2700).await; // straight into halftime

        assert_eq!(timeout_rx.recv().await.unwrap(), 0);
        // The break timer now ticks with the master clock.
        engine.on_master_tick().await;
        assert_eq!(timeout_rx.recv().await.unwrap(), 1);
        assert_eq!(engine.timeout_value().await, 1);
    }

    #[tokio::test]
    async fn knockout_draw_waits_for_extra_time_confirmation() {
        let engine = knockout_engine();
        engine.start_second_half().await;
        engine.set_stoppage_time(2).await;
        engine.change_score(TeamSide::Home, 1).await;
        engine.change_score(TeamSide::Away, 1).await;
        engine.add_time(2819).await; // one second short of 90:00 + 2:00

        engine.tick(1).await;
        let snap = engine.snapshot().await;
        assert_eq!(snap.timer, FULLTIME_SECS + 120);
        assert_eq!(snap.phase, MatchPhase::ExtraTimeFirstPending);

        // The operator confirms; extra time arms the clock by itself.
        engine.start_extra_time_first().await;
        engine.on_master_tick().await;
        assert_eq!(engine.snapshot().await.timer, FULLTIME_SECS + 1);
    }

    #[tokio::test]
    async fn penalties_do_not_arm_the_clock() {
        let engine = knockout_engine();
        engine.start_penalties().await;
        engine.on_master_tick().await;
        let snap = engine.snapshot().await;
        assert_eq!(snap.timer, 0);
        assert!(snap.penalties);

        engine.push_kick(TeamSide::Home, PenaltyKick::Goal).await;
        engine.push_kick(TeamSide::Away, PenaltyKick::Miss).await;
        let snap = engine.snapshot().await;
        assert_eq!(snap.shootout.goals(TeamSide::Home), 1);
        assert_eq!(snap.shootout.goals(TeamSide::Away), 0);
    }

    #[tokio::test]
    async fn reset_restores_the_configured_fixture() {
        let engine = knockout_engine();
        engine.start_second_half().await;
        engine.change_score(TeamSide::Home, 3).await;
        engine.set_stoppage_time(5).await;

        engine.reset_match().await;
        let snap = engine.snapshot().await;
        assert_eq!(snap.phase, MatchPhase::FirstHalf);
        assert_eq!(snap.timer, 0);
        assert_eq!(snap.home.score, 0);
        assert_eq!(snap.away.score, 0);
        assert_eq!(snap.stoppage_time, 0);
        assert!(snap.shootout.home.is_empty());

        // The clock was stopped by the reset.
        engine.on_master_tick().await;
        assert_eq!(engine.snapshot().await.timer, 0);
    }

    #[tokio::test]
    async fn late_joiners_pull_a_snapshot_instead_of_replay() {
        let engine = MatchEngine::new(MatchConfig::default());
        engine.change_score(TeamSide::Away, 2).await;

        let (id, mut feed) = engine.attach_display("east stand").await;
        assert_eq!(feed.snapshot.away.score, 2);
        assert_eq!(feed.config.home.name, "Team A");
        // Nothing published before the attach is replayed.
        assert!(matches!(feed.updates.try_recv(), Err(TryRecvError::Empty)));

        engine.change_score(TeamSide::Away, 1).await;
        assert_eq!(feed.updates.recv().await.unwrap().away.score, 3);

        assert_eq!(engine.displays().await.len(), 1);
        assert!(engine.close_display(id).await);
        assert!(!engine.close_display(id).await);
        assert!(engine.displays().await.is_empty());
    }

    #[tokio::test]
    async fn saving_config_rebroadcasts_it() {
        let engine = MatchEngine::new(MatchConfig::default());
        let mut config_rx = engine.subscribe_config();
        let mut style_rx = engine.subscribe_style();

        let mut config = MatchConfig::default();
        config.home.name = "Rovers".to_string();
        config.style.theme = "night".to_string();
        engine.save_config(config).await.unwrap();

        assert_eq!(config_rx.recv().await.unwrap().home.name, "Rovers");
        assert_eq!(style_rx.recv().await.unwrap().theme, "night");
    }
}
