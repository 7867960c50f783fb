use anyhow::Result;
use pitchside::components::display::ScoreboardView;
use pitchside::prelude::*;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    // 2. Load the fixture configuration (defaults if the file is absent).
    let engine = MatchEngine::with_config_file("pitchside.toml");

    // 3. Spawn concurrent tasks to listen to different event streams.
    spawn_event_listeners(&engine).await;

    // 4. Kick off so there is something to watch.
    engine.start_first_half().await;

    // 5. Run the engine. This is a blocking call that will only return
    //    when the application receives a shutdown signal (Ctrl+C).
    engine.run().await?;

    Ok(())
}

/// Spawns several tasks, each subscribing to a different stream from the
/// engine, plus one console display.
async fn spawn_event_listeners(engine: &MatchEngine) {
    // --- Engine Event Listener ---
    let mut event_rx = engine.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            info!("[ENGINE] => {:?}", event);
        }
    });

    // --- Break Timer Listener ---
    let mut timeout_rx = engine.subscribe_timeout();
    tokio::spawn(async move {
        while let Ok(elapsed) = timeout_rx.recv().await {
            if elapsed % 30 == 0 {
                info!("[BREAK] => {}s into the break", elapsed);
            }
        }
    });

    // --- A console display window ---
    let (_display_id, mut feed) = engine.attach_display("console").await;
    info!(
        "[DISPLAY] => bootstrapped with {}",
        ScoreboardView::from(&*feed.snapshot).headline()
    );
    tokio::spawn(async move {
        while let Ok(snapshot) = feed.updates.recv().await {
            // Log every 30th second of play to avoid spam, plus every
            // out-of-band change (they arrive between whole minutes).
            if snapshot.timer % 30 == 0 {
                info!("[DISPLAY] => {}", ScoreboardView::from(&*snapshot).headline());
            }
        }
    });
}
