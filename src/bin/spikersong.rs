use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use spikersong::config::{AppConfig, Mode};
use spikersong::mapping::Note;
use spikersong::offline::transcribe_wav;
use spikersong::replay::ReplaySource;
use spikersong::session::{CancellationToken, NotePlayer, NullDisplay, SessionController};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("spikersong error: {err:?}");
            ExitCode::from(1)
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "spikersong", about = "EMG sonification pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn execute(self) -> Result<()> {
        match self.command {
            Command::Live(args) => live_command(args),
            Command::Transcribe(args) => transcribe_command(args),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the live pipeline over a raw serial capture.
    Live(LiveArgs),
    /// Transcribe a WAV file to one note per window.
    Transcribe(TranscribeArgs),
}

#[derive(Args, Debug)]
struct LiveArgs {
    /// Raw byte capture of the amplifier stream to replay.
    #[arg(long)]
    replay: PathBuf,
    /// JSON configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Session mode override.
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Participant baseline override (performance mode).
    #[arg(long)]
    min_hz: Option<f64>,
    #[arg(long)]
    max_hz: Option<f64>,
    /// Instrument id passed to the sonification backend.
    #[arg(long)]
    instrument: Option<u32>,
    /// Stop after this many seconds instead of running until interrupted.
    #[arg(long)]
    session_secs: Option<f64>,
}

#[derive(Args, Debug)]
struct TranscribeArgs {
    /// WAV file to transcribe.
    #[arg(long)]
    wav: PathBuf,
    /// Window length in seconds.
    #[arg(long, default_value_t = 1.0)]
    window_secs: f64,
}

/// Sonification stub: logs the note and honours rests by sleeping, keeping
/// the cycle cadence of a real backend.
struct LogPlayer;

impl NotePlayer for LogPlayer {
    fn play(&mut self, note: Note, instrument: u32) {
        println!("play {note} (instrument {instrument})");
    }

    fn rest(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

fn live_command(args: LiveArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mapping.mode = mode;
    }
    if let Some(min_hz) = args.min_hz {
        config.mapping.participant_min_hz = min_hz;
    }
    if let Some(max_hz) = args.max_hz {
        config.mapping.participant_max_hz = max_hz;
    }
    if let Some(instrument) = args.instrument {
        config.mapping.instrument_id = instrument;
    }
    if args.session_secs.is_some() {
        config.acquisition.total_session_secs = args.session_secs;
    }

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("interrupt received, finishing current cycle");
        handler_token.cancel();
    })
    .context("installing interrupt handler")?;

    let source = ReplaySource::open(&args.replay)?;
    let mode = config.mapping.mode;
    let controller = SessionController::new(source, LogPlayer, NullDisplay, config, cancel);

    let report = controller.run(|out| {
        println!(
            "dominant {:.2} Hz, rescaled {}, note {}",
            out.raw_hz,
            out.rescaled_hz
                .map(|f| format!("{f:.2} Hz"))
                .unwrap_or_else(|| "-".to_string()),
            out.note
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    })?;

    println!("session ended after {} cycles", report.cycles);
    if mode == Mode::Calibration {
        match report.calibration.and_then(|range| range.bounds()) {
            Some((min_hz, max_hz)) => {
                println!("participant range: {min_hz:.2} Hz .. {max_hz:.2} Hz")
            }
            None => println!("no data observed"),
        }
    }
    Ok(())
}

fn transcribe_command(args: TranscribeArgs) -> Result<()> {
    let events = transcribe_wav(&args.wav, args.window_secs)
        .with_context(|| format!("transcribing {}", args.wav.display()))?;
    for (i, event) in events.iter().enumerate() {
        println!("{:>6.1}s  {event}", i as f64 * args.window_secs);
    }
    Ok(())
}
