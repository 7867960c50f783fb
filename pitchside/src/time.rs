//! The master ticker driving the engine.
//!
//! `SystemClock` is the single source of elapsed real time: one task that
//! broadcasts a [`TickEvent`] every period and stops on the shutdown signal.
//! Whether a tick advances the match clock is the engine's decision, not
//! the ticker's.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant};
use tracing::trace;

/// The fixed tick period of the match clock.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One tick of the master clock.
#[derive(Debug, Clone)]
pub struct TickEvent {
    /// Monotonically increasing tick counter, starting at 1.
    pub tick_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// Broadcasts a tick every `period` until shut down.
pub struct SystemClock {
    period: Duration,
    tick_sender: broadcast::Sender<Arc<TickEvent>>,
}

impl SystemClock {
    pub fn new(period: Duration, tick_sender: broadcast::Sender<Arc<TickEvent>>) -> Self {
        Self {
            period,
            tick_sender,
        }
    }

    /// Runs the tick loop until a shutdown signal is received.
    ///
    /// The first tick fires one full period after start, so a freshly
    /// started clock never advances state at time zero.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        let mut tick_count: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = ticker.tick() => {
                    tick_count += 1;
                    trace!("master tick #{tick_count}");
                    self.tick_sender
                        .send(Arc::new(TickEvent {
                            tick_count,
                            timestamp: Utc::now(),
                        }))
                        .ok();
                }
            }
        }
    }
}
