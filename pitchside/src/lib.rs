//! # Pitchside
//!
//! An event-driven control engine for live football match scoreboards.
//!
//! Pitchside runs the authoritative match state (teams, scores, the game
//! clock, phase transitions, stoppage time and penalty shootouts) in one
//! control process, and fans every change out to any number of display
//! windows over broadcast channels.
//!
//! ## Core Concepts
//!
//! - **SystemClock**: a one-per-second ticker that is the single source of
//!   elapsed time. Whether a tick advances the match is the engine's call.
//! - **Pure transitions**: every clock movement is a [`clock::Trigger`]
//!   applied by one pure function, returning the effects the engine must
//!   carry out. Halftime at 45:00 and friends are rules, not timers.
//! - **Broadcast fan-out**: displays subscribe to snapshot, break-timer and
//!   configuration streams; publishing never blocks on a slow consumer.
//!   Late joiners bootstrap from a point-in-time snapshot instead.
//! - **Operator-driven**: automatic transitions stop the clock at phase
//!   boundaries; only explicit operator actions start the next phase.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pitchside::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load the fixture (falls back to defaults if the file is bad).
//!     let engine = MatchEngine::with_config_file("pitchside.toml");
//!
//!     // 2. Attach a display before kickoff.
//!     let (_id, mut feed) = engine.attach_display("main stand").await;
//!     tokio::spawn(async move {
//!         while let Ok(snapshot) = feed.updates.recv().await {
//!             println!("{}", ScoreboardView::from(&*snapshot).headline());
//!         }
//!     });
//!
//!     // 3. Kick off and run. The engine shuts down on Ctrl+C.
//!     engine.start_first_half().await;
//!     engine.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Pitchside Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod clock;
pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod state;
pub mod time;

/// A prelude module for easy importing of the most common Pitchside types.
pub mod prelude {
    pub use crate::clock::PhaseStart;
    pub use crate::common::DisplayId;
    pub use crate::components::display::{DisplayFeed, ScoreboardView};
    pub use crate::components::timeout::TimeoutTimer;
    pub use crate::config::{MatchConfig, ScoreboardStyle, TeamConfig};
    pub use crate::engine::MatchEngine;
    pub use crate::events::EngineEvent;
    pub use crate::state::{
        MatchKind, MatchPhase, MatchState, PenaltyKick, StatePatch, TeamSide,
    };
}
