//! Engine lifecycle events.
//!
//! Diagnostics-grade notifications about the engine itself, broadcast
//! alongside the scoreboard snapshots. Display surfaces render snapshots;
//! the control panel and logs listen here.

use crate::common::DisplayId;
use crate::state::MatchPhase;
use chrono::{DateTime, Utc};

/// Events related to the lifecycle and state of the engine itself.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Fired once when the engine's `run` loop begins.
    EngineStarted { at: DateTime<Utc> },
    /// Fired once when the engine's `run` loop is about to exit.
    EngineShutdown,
    /// The ticking interval was armed.
    ClockStarted,
    /// The ticking interval was stopped, by the operator or by a phase
    /// boundary.
    ClockStopped,
    /// The match moved from one phase to another.
    PhaseChanged { from: MatchPhase, to: MatchPhase },
    /// A display window subscribed.
    DisplayAttached { id: DisplayId },
    /// A display window was closed or detached.
    DisplayClosed { id: DisplayId },
    /// The fixture configuration was saved and rebroadcast.
    ConfigSaved,
}
