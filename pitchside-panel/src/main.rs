use anyhow::Result;
use colored::Colorize;
use pitchside::components::display::ScoreboardView;
use pitchside::prelude::*;
use pitchside::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const PANEL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct PanelHighlighter;

impl Highlighter for PanelHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    // Embedded at compile time; `logo.log` sits in the crate root.
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Panel   v{:<8} Library   v{:<8}",
        PANEL_VERSION, LIB_VERSION
    );

    println!("{}", "-----------------------------------------------------------------".dimmed());
    println!("{}", version_string);
    println!("{}", "-----------------------------------------------------------------".dimmed());
}

/// Spawns tasks echoing the engine's streams into the console.
fn spawn_event_listeners(engine: &MatchEngine, is_watching: Arc<AtomicBool>) {
    // Engine lifecycle events.
    let mut event_rx = engine.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            println!("\n<-- [ENGINE EVENT] {:?}\n>> ", event);
        }
    });

    // Scoreboard snapshots (controlled by the shared flag).
    let mut snapshot_rx = engine.subscribe_snapshots();
    tokio::spawn(async move {
        while let Ok(snapshot) = snapshot_rx.recv().await {
            if is_watching.load(Ordering::Relaxed) {
                println!("<-- [BOARD] {}", ScoreboardView::from(&*snapshot).headline());
            }
        }
    });
}

fn parse_side(token: &str) -> Option<TeamSide> {
    match token {
        "home" | "a" => Some(TeamSide::Home),
        "away" | "b" => Some(TeamSide::Away),
        _ => None,
    }
}

/// Phase-start gating, mirroring what the control panel buttons allow.
async fn try_start_phase(engine: &MatchEngine, which: &str) {
    let snapshot = engine.snapshot().await;
    match which {
        "first" => {
            if snapshot.phase == MatchPhase::FirstHalf {
                engine.start_first_half().await;
                println!("--> First half under way.");
            } else {
                println!("Allowed only in FIRST_HALF (currently {:?}).", snapshot.phase);
            }
        }
        "second" => {
            if snapshot.phase == MatchPhase::Halftime {
                engine.start_second_half().await;
                println!("--> Second half under way.");
            } else {
                println!("Allowed only in HALFTIME (currently {:?}).", snapshot.phase);
            }
        }
        "et1" => {
            if snapshot.phase == MatchPhase::ExtraTimeFirstPending && snapshot.scores_level() {
                engine.start_extra_time_first().await;
                println!("--> Extra time, first period.");
            } else {
                println!("Extra time needs a level score at the end of the second half.");
            }
        }
        "et2" => {
            if snapshot.phase == MatchPhase::ExtraTimeSecondPending {
                engine.start_extra_time_second().await;
                println!("--> Extra time, second period.");
            } else {
                println!(
                    "Allowed only in EXTRA_TIME_SECOND_PENDING (currently {:?}).",
                    snapshot.phase
                );
            }
        }
        "pens" => {
            if snapshot.phase == MatchPhase::ExtraTimeEnd && snapshot.scores_level() {
                engine.start_penalties().await;
                println!("--> Penalty shootout. The match clock stays down.");
            } else {
                println!("Penalties need a level score at the end of extra time.");
            }
        }
        other => println!("Unknown phase '{}'. Try first|second|et1|et2|pens.", other),
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  show                        - Current snapshot, break timer and displays.");
    println!("  phase <first|second|et1|et2|pens>");
    println!("                              - Start the named phase (gated by match state).");
    println!("  resume | pause              - Drive the match clock.");
    println!("  goal <home|away>            - +1 to a team's score.");
    println!("  minus <home|away>           - -1 (clamped at zero).");
    println!("  add <SECS> | sub <SECS>     - Manual clock corrections.");
    println!("  stoppage <MIN>              - Announce stoppage minutes (0-30).");
    println!("  pen <home|away> <goal|miss> - Record a penalty kick.");
    println!("  pen <home|away> undo        - Remove the team's last kick.");
    println!("  pen <home|away> toggle <N>  - Flip kick N between goal and miss.");
    println!("  break <start|pause|reset>   - Drive the break timer.");
    println!("  break set <MIN> <SEC>       - Set the break length (clamped).");
    println!("  watch <on|off>              - Echo every published snapshot.");
    println!("  attach <LABEL>              - Attach a console display window.");
    println!("  displays                    - List attached displays.");
    println!("  close <HANDLE>              - Close a display by its handle.");
    println!("  reset                       - Reset the whole match.");
    println!("  exit                        - Quit the panel.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let engine = MatchEngine::with_config_file("pitchside.toml");
    let engine_handle = engine.clone();

    // Shared flag for the snapshot echo listener.
    let is_watching = Arc::new(AtomicBool::new(false));
    spawn_event_listeners(&engine_handle, is_watching.clone());

    info!("Spawning {} in the background...", ENGINE_NAME);
    tokio::spawn(async move {
        if let Err(e) = engine.run().await {
            eprintln!("\nEngine stopped with an error: {}", e);
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    // The panel's display bookkeeping: small handles instead of raw keys.
    let mut attached: HashMap<usize, DisplayId> = HashMap::new();
    let mut next_handle: usize = 0;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(PanelHighlighter {}));

    println!(
        "{} is running. Type 'help' for commands or 'exit' to quit.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let readline = rl.readline(&prompt);
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.trim().split_whitespace().collect::<Vec<_>>();

                let Some(command) = args.first() else { continue };
                match *command {
                    "show" => {
                        let snapshot = engine_handle.snapshot().await;
                        println!("{}", ScoreboardView::from(&*snapshot).headline());
                        println!(
                            "  break timer: {}s | displays attached: {}",
                            engine_handle.timeout_value().await,
                            engine_handle.displays().await.len()
                        );
                    }
                    "phase" => {
                        if let Some(which) = args.get(1) {
                            try_start_phase(&engine_handle, which).await;
                        } else {
                            println!("Usage: phase <first|second|et1|et2|pens>");
                        }
                    }
                    "resume" => engine_handle.resume_clock().await,
                    "pause" => engine_handle.pause_clock(),
                    "goal" | "minus" => {
                        let delta = if *command == "goal" { 1 } else { -1 };
                        match args.get(1).and_then(|t| parse_side(t)) {
                            Some(side) => engine_handle.change_score(side, delta).await,
                            None => println!("Usage: {} <home|away>", command),
                        }
                    }
                    "add" | "sub" => match args.get(1).and_then(|s| s.parse::<u32>().ok()) {
                        Some(seconds) if *command == "add" => {
                            engine_handle.add_time(seconds).await
                        }
                        Some(seconds) => engine_handle.subtract_time(seconds).await,
                        None => println!("Usage: {} <SECONDS>", command),
                    },
                    "stoppage" => match args.get(1).and_then(|s| s.parse::<u32>().ok()) {
                        Some(minutes) => {
                            engine_handle.set_stoppage_time(minutes).await;
                            println!(
                                "--> Stoppage now {} min.",
                                engine_handle.snapshot().await.stoppage_time
                            );
                        }
                        None => println!("Usage: stoppage <MINUTES>"),
                    },
                    "pen" => {
                        let side = args.get(1).and_then(|t| parse_side(t));
                        match (side, args.get(2)) {
                            (Some(side), Some(&"goal")) => {
                                engine_handle.push_kick(side, PenaltyKick::Goal).await
                            }
                            (Some(side), Some(&"miss")) => {
                                engine_handle.push_kick(side, PenaltyKick::Miss).await
                            }
                            (Some(side), Some(&"undo")) => engine_handle.undo_kick(side).await,
                            (Some(side), Some(&"toggle")) => {
                                match args.get(3).and_then(|s| s.parse::<usize>().ok()) {
                                    Some(index) => engine_handle.toggle_kick(side, index).await,
                                    None => println!("Usage: pen <home|away> toggle <INDEX>"),
                                }
                            }
                            _ => println!("Usage: pen <home|away> <goal|miss|undo|toggle>"),
                        }
                    }
                    "break" => match args.get(1) {
                        Some(&"start") => engine_handle.timeout_start().await,
                        Some(&"pause") => engine_handle.timeout_pause().await,
                        Some(&"reset") => engine_handle.timeout_reset().await,
                        Some(&"set") => {
                            let minutes = args.get(2).and_then(|s| s.parse::<u32>().ok());
                            let seconds = args.get(3).and_then(|s| s.parse::<u32>().ok());
                            match (minutes, seconds) {
                                (Some(m), Some(s)) => {
                                    engine_handle.set_timeout_duration(m, s).await
                                }
                                _ => println!("Usage: break set <MIN> <SEC>"),
                            }
                        }
                        _ => println!("Usage: break <start|pause|reset|set>"),
                    },
                    "watch" => match args.get(1) {
                        Some(&"on") => {
                            is_watching.store(true, Ordering::Relaxed);
                            println!("--> Echoing every published snapshot.");
                        }
                        Some(&"off") => {
                            is_watching.store(false, Ordering::Relaxed);
                            println!("--> Snapshot echo off.");
                        }
                        _ => println!("Usage: watch <on|off>"),
                    },
                    "attach" => {
                        let label = args.get(1).unwrap_or(&"display").to_string();
                        let (id, mut feed) = engine_handle.attach_display(&label).await;
                        let handle = next_handle;
                        attached.insert(handle, id);
                        next_handle += 1;
                        let feed_label = label.clone();
                        tokio::spawn(async move {
                            while let Ok(snapshot) = feed.updates.recv().await {
                                println!(
                                    "<-- [{}] {}",
                                    feed_label,
                                    ScoreboardView::from(&*snapshot).headline()
                                );
                            }
                        });
                        println!("--> Attached display '{}' with handle #{}", label, handle);
                    }
                    "displays" => {
                        println!("Attached displays:");
                        for (handle, id) in &attached {
                            println!("  Handle #{}: {:?}", handle, id);
                        }
                    }
                    "close" => match args.get(1).and_then(|s| s.parse::<usize>().ok()) {
                        Some(handle) => {
                            if let Some(id) = attached.get(&handle).copied() {
                                if engine_handle.close_display(id).await {
                                    println!("--> Display closed.");
                                } else {
                                    println!("--> Error: display not found in engine.");
                                }
                                attached.remove(&handle);
                            } else {
                                println!(
                                    "Error: invalid handle #{}. Use 'displays' to list them.",
                                    handle
                                );
                            }
                        }
                        None => println!("Usage: close <HANDLE>"),
                    },
                    "reset" => {
                        engine_handle.reset_match().await;
                        println!("--> Match reset to kickoff.");
                    }
                    "help" => print_help(),
                    "exit" => break,
                    _ => println!("Unknown command: '{}'. Type 'help'.", line),
                }
            }
            Err(_) => {
                println!("Exiting panel...");
                break;
            }
        }
    }

    Ok(())
}
