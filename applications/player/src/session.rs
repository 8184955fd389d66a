//! Interactive terminal session
//!
//! Reads one command per line from stdin, turns it into controller intents,
//! and prints transport changes and notices as they happen.

use crate::error::Result;
use crate::upload::Uploader;
use cadence_core::{Library, TrackId};
use cadence_playback::{ControllerHandle, PlaybackPhase, TransportState};
use std::fmt::Write as _;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

pub const HELP: &str = "\
Commands:
  ls                 list the library
  play <n|id>        play track by list number or id
  play               resume (or start the first track)
  pause              pause
  toggle | p         play/pause
  next | n           next track
  prev | b           previous track (restarts after a few seconds in)
  seek <seconds>     jump to position
  vol <0-100>        set volume in percent
  shuffle            toggle shuffle
  repeat             cycle repeat off/all/one
  refresh            re-list the library folder
  upload <files...>  upload local audio files, then refresh
  status             show the current state
  help               this text
  quit | q           exit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    /// `play <n|id>`: a 1-based list number or a track id
    Select(String),
    Play,
    Pause,
    Toggle,
    Next,
    Prev,
    Seek(f64),
    /// Percent, 0-100
    Volume(f32),
    Shuffle,
    Repeat,
    Refresh,
    Upload(Vec<PathBuf>),
    Status,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "ls" | "list" => Command::List,
        "play" => match rest.as_slice() {
            [] => Command::Play,
            [target] => Command::Select((*target).to_string()),
            _ => return Err("usage: play <n|id>".to_string()),
        },
        "pause" => Command::Pause,
        "toggle" | "p" => Command::Toggle,
        "next" | "n" => Command::Next,
        "prev" | "b" => Command::Prev,
        "seek" => {
            let [value] = rest.as_slice() else {
                return Err("usage: seek <seconds>".to_string());
            };
            let seconds = value
                .parse::<f64>()
                .map_err(|_| format!("not a number: {}", value))?;
            Command::Seek(seconds)
        }
        "vol" | "volume" => {
            let [value] = rest.as_slice() else {
                return Err("usage: vol <0-100>".to_string());
            };
            let percent = value
                .trim_end_matches('%')
                .parse::<f32>()
                .map_err(|_| format!("not a number: {}", value))?;
            Command::Volume(percent)
        }
        "shuffle" => Command::Shuffle,
        "repeat" => Command::Repeat,
        "refresh" => Command::Refresh,
        "upload" => {
            if rest.is_empty() {
                return Err("usage: upload <files...>".to_string());
            }
            Command::Upload(rest.iter().map(PathBuf::from).collect())
        }
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {} (try help)", other)),
    };
    Ok(Some(command))
}

/// Resolve `play` targets: list numbers first, then ids
pub fn resolve_track(target: &str, library: &Library) -> Option<TrackId> {
    if let Ok(n) = target.parse::<usize>() {
        if let Some(track) = n.checked_sub(1).and_then(|i| library.tracks().get(i)) {
            return Some(track.id.clone());
        }
    }
    let id = TrackId::new(target);
    library.contains(&id).then_some(id)
}

pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Numbered listing with the active track marked
pub fn format_library(library: &Library, state: &TransportState) -> String {
    if library.is_empty() {
        return "Library is empty".to_string();
    }
    let active = state.active_track.as_ref().map(|t| &t.id);
    let mut out = String::new();
    for (i, track) in library.iter().enumerate() {
        let marker = if Some(&track.id) == active { '>' } else { ' ' };
        let _ = writeln!(out, "{} {:>3}. {}", marker, i + 1, track.display_name);
    }
    out.pop();
    out
}

/// One status line for the transport
pub fn format_state(state: &TransportState) -> String {
    let mut line = match state.phase() {
        PlaybackPhase::Idle => "Stopped".to_string(),
        PlaybackPhase::Loading => format!(
            "Loading {}",
            state
                .pending_track
                .as_ref()
                .map_or("", |t| t.display_name.as_str())
        ),
        PlaybackPhase::Playing | PlaybackPhase::Paused => {
            let verb = if state.playing { "Playing" } else { "Paused" };
            let name = state
                .active_track
                .as_ref()
                .map_or("", |t| t.display_name.as_str());
            let duration = state
                .duration_seconds
                .map_or_else(|| "--:--".to_string(), format_time);
            format!(
                "{} {} [{} / {}]",
                verb,
                name,
                format_time(state.position_seconds),
                duration
            )
        }
    };
    let _ = write!(
        line,
        "  vol {}%  shuffle {}  repeat {}",
        (state.volume * 100.0).round() as u32,
        if state.shuffle_on { "on" } else { "off" },
        state.repeat_mode
    );
    line
}

/// Differences worth printing; position ticks alone are not
fn worth_printing(old: &TransportState, new: &TransportState) -> bool {
    old.active_track != new.active_track
        || old.pending_track != new.pending_track
        || old.playing != new.playing
        || old.volume != new.volume
        || old.shuffle_on != new.shuffle_on
        || old.repeat_mode != new.repeat_mode
        || old.duration_seconds != new.duration_seconds
}

/// Print transport changes and notices until the controller goes away
async fn watch_output(handle: ControllerHandle) {
    let mut states = handle.subscribe();
    let mut notices = handle.notices();
    let mut last = states.borrow_and_update().clone();

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if worth_printing(&last, &state) {
                    println!("{}", format_state(&state));
                }
                last = state;
            }
            notice = notices.recv() => match notice {
                Ok(notice) => println!("! {}", notice),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Notice output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

/// Run the session until `quit`, end of input, or controller shutdown
pub async fn run(handle: ControllerHandle, uploader: Uploader) -> Result<()> {
    println!("Cadence. Type 'help' for commands.");
    let printer = tokio::spawn(watch_output(handle.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        dispatch(&handle, &uploader, command).await?;
    }

    printer.abort();
    Ok(())
}

async fn dispatch(handle: &ControllerHandle, uploader: &Uploader, command: Command) -> Result<()> {
    match command {
        Command::List => println!("{}", format_library(&handle.library(), &handle.state())),
        Command::Select(target) => match resolve_track(&target, &handle.library()) {
            Some(id) => handle.select_track(id)?,
            None => println!("No track {}", target),
        },
        Command::Play => handle.play()?,
        Command::Pause => handle.pause()?,
        Command::Toggle => handle.toggle_play_pause()?,
        Command::Next => handle.next()?,
        Command::Prev => handle.prev()?,
        Command::Seek(seconds) => handle.seek(seconds)?,
        Command::Volume(percent) => handle.set_volume(percent / 100.0)?,
        Command::Shuffle => handle.toggle_shuffle()?,
        Command::Repeat => handle.cycle_repeat()?,
        Command::Refresh => handle.refresh_library()?,
        Command::Upload(files) => {
            match uploader.upload_all(&files).await {
                Ok(summary) => println!("{}", summary),
                Err(e) => {
                    warn!(error = %e, "Upload failed");
                    println!("Upload failed: {}", e);
                }
            }
            handle.refresh_library()?;
        }
        Command::Status => println!("{}", format_state(&handle.state())),
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}
