use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use env_logger::Env;
use practice_metronome::config::{
    DEFAULT_BEATS_PER_BAR, DEFAULT_BPM, DEFAULT_SUBDIVISIONS, DEFAULT_TEMPO_CHANGE_INTERVAL,
};
use practice_metronome::{
    BeatEvent, ClickType, EngineConfig, NotificationConsumer, NotificationKind, NotificationLevel,
    PlaybackController, PlaybackOptions, PlaybackTarget, SongLibrary, StopReason, TapTempo,
    TempoRampConfig, TimingConfig,
};
use ringbuf::traits::Consumer;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How often the main loop drains notifications
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Parser, Clone)]
#[command(name = "practice-metronome")]
#[command(about = "Practice metronome with songs, setlists and tempo ramps")]
struct Cli {
    /// Tempo in beats per minute
    #[arg(long, default_value_t = DEFAULT_BPM)]
    bpm: f64,

    /// Beats per bar
    #[arg(long, default_value_t = DEFAULT_BEATS_PER_BAR)]
    beats: u32,

    /// Clicks per beat
    #[arg(long, default_value_t = DEFAULT_SUBDIVISIONS)]
    subdivisions: u32,

    /// Swing the off-beat (forces two clicks per beat)
    #[arg(long)]
    swing: bool,

    /// Count-in bars before basic playback (defaults to the engine config)
    #[arg(long)]
    count_in: Option<u32>,

    /// Stop after this many seconds (0 = until stopped)
    #[arg(long, default_value_t = 0.0)]
    auto_stop: f64,

    /// Change the tempo by this many BPM (negative slows down)
    #[arg(long, allow_hyphen_values = true)]
    ramp_step: Option<f64>,

    /// Bars between ramp steps
    #[arg(long, default_value_t = DEFAULT_TEMPO_CHANGE_INTERVAL)]
    ramp_every: u32,

    /// Play a song from the library
    #[arg(long, conflicts_with = "setlist")]
    song: Option<String>,

    /// Play a setlist from the library
    #[arg(long)]
    setlist: Option<String>,

    /// Override the song library directory
    #[arg(long)]
    library: Option<PathBuf>,

    /// Engine configuration file (RON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// List library songs and setlists, then exit
    #[arg(long)]
    list: bool,

    /// Measure a tempo by pressing Enter, then exit
    #[arg(long)]
    tap: bool,
}

fn main() -> ExitCode {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("ERROR: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if cli.tap {
        return run_tap();
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };

    let library_dir = cli.library.clone().unwrap_or_else(SongLibrary::default_dir);
    if cli.list {
        let library = SongLibrary::open(&library_dir).map_err(|e| e.to_string())?;
        return list_library(&library);
    }

    let target = build_target(&cli, &config, &library_dir)?;
    let options = build_options(&cli);

    let sink = Arc::new(|event: &BeatEvent| {
        let mark = match event.click_type() {
            ClickType::Accent => "TICK",
            ClickType::Regular => "tock",
        };
        let count_in = if event.is_count_in { " (count-in)" } else { "" };
        println!("{} {:.1} BPM{}", mark, event.bpm_at_emission, count_in);
    });

    let (mut controller, notifications) = PlaybackController::new(sink, config);
    controller.start(target, options).map_err(|e| e.to_string())?;
    println!("Playing. Type a BPM and Enter to change tempo, q to stop.");

    let input = spawn_stdin_reader();
    let reason = drive(&controller, notifications, &input);
    // Reaps the finished clock thread
    drop(controller);
    println!("Stopped: {}", reason);
    Ok(())
}

fn build_target(
    cli: &Cli,
    config: &EngineConfig,
    library_dir: &Path,
) -> Result<PlaybackTarget, String> {
    if let Some(name) = &cli.song {
        let library = SongLibrary::open(library_dir).map_err(|e| e.to_string())?;
        let song = library.load_song(name).map_err(|e| e.to_string())?;
        println!(
            "Song '{}': {} bars in {} sections",
            song.name(),
            song.total_bars(),
            song.sections().len()
        );
        return Ok(PlaybackTarget::Song(Arc::new(song)));
    }
    if let Some(name) = &cli.setlist {
        let library = SongLibrary::open(library_dir).map_err(|e| e.to_string())?;
        let setlist = library.load_setlist(name).map_err(|e| e.to_string())?;
        return Ok(PlaybackTarget::Setlist(Arc::new(setlist)));
    }

    let timing = TimingConfig::new(cli.bpm, cli.beats, cli.subdivisions).with_swing(cli.swing);
    Ok(PlaybackTarget::Basic {
        timing,
        count_in_bars: cli.count_in.unwrap_or(config.count_in_bars),
    })
}

fn build_options(cli: &Cli) -> PlaybackOptions {
    let ramp = match cli.ramp_step {
        Some(step) if step < 0.0 => TempoRampConfig::slow_down(-step, cli.ramp_every),
        Some(step) => TempoRampConfig::speed_up(step, cli.ramp_every),
        None => TempoRampConfig::default(),
    };
    PlaybackOptions::default()
        .with_auto_stop(cli.auto_stop)
        .with_ramp(ramp)
}

/// Prints notifications and forwards user input until playback stops
fn drive(
    controller: &PlaybackController,
    mut notifications: NotificationConsumer,
    input: &Receiver<String>,
) -> StopReason {
    loop {
        while let Some(notification) = notifications.try_pop() {
            if let NotificationKind::Stopped(reason) = notification.kind {
                return reason;
            }
            let prefix = match notification.level {
                NotificationLevel::Info => "--",
                NotificationLevel::Warning => "!!",
            };
            println!("{} {}", prefix, describe(&notification.kind));
        }

        match input.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                let line = line.trim();
                if line.eq_ignore_ascii_case("q") {
                    controller.cancel();
                } else if let Ok(bpm) = line.parse::<f64>() {
                    if let Err(e) = controller.set_live_bpm(bpm) {
                        eprintln!("ERROR: {}", e);
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            // stdin closed: keep playing until the run ends on its own
            Err(RecvTimeoutError::Disconnected) => thread::sleep(POLL_INTERVAL),
        }
    }
}

fn describe(kind: &NotificationKind) -> String {
    match kind {
        NotificationKind::CountInComplete => "Count-in complete".to_string(),
        NotificationKind::SectionChanged { index, name } => {
            format!("Section {}: {}", index + 1, name)
        }
        NotificationKind::SongChanged { index, name } => format!("Song {}: {}", index + 1, name),
        NotificationKind::SongComplete { index } => format!("Song {} complete", index + 1),
        NotificationKind::SetlistComplete => "Setlist complete".to_string(),
        NotificationKind::TempoChanged { bpm } => format!("Tempo {:.1} BPM", bpm),
        NotificationKind::TimingDegraded { lateness } => format!("Tick late by {:?}", lateness),
        NotificationKind::Misuse(misuse) => misuse.to_string(),
        NotificationKind::Stopped(reason) => format!("Stopped: {}", reason),
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let spawned = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Keyboard input unavailable: {}", e);
    }
    rx
}

fn run_tap() -> Result<(), String> {
    println!("Press Enter on each beat, q to finish.");
    let mut tap = TapTempo::new();
    let mut last = None;
    for line in std::io::stdin().lock().lines() {
        let line = line.map_err(|e| e.to_string())?;
        if line.trim().eq_ignore_ascii_case("q") {
            break;
        }
        match tap.tap(Instant::now()) {
            Some(bpm) => {
                println!("{:.0} BPM", bpm);
                last = Some(bpm);
            }
            None => println!("..."),
        }
    }
    if let Some(bpm) = last {
        println!("Tapped tempo: {:.0} BPM", bpm);
    }
    Ok(())
}

fn list_library(library: &SongLibrary) -> Result<(), String> {
    println!("Library: {}", library.root().display());
    println!("Songs:");
    for name in library.list_songs().map_err(|e| e.to_string())? {
        println!("  {}", name);
    }
    println!("Setlists:");
    for name in library.list_setlists().map_err(|e| e.to_string())? {
        println!("  {}", name);
    }
    Ok(())
}
