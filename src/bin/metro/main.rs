//! metro - terminal metronome with tap tempo and a pitch reference tone
//!
//! Run with: cargo run --bin metro -- --bpm 100 --signature 6/8

mod app;
mod logger;
mod ui;

use clap::Parser;
use saavy_metronome::{
    dsp::Waveform,
    metronome::{DEFAULT_BPM, MAX_BPM, MIN_BPM},
    sequencing::TimeSignature,
    voices::SoundType,
};

/// Metronome with tap tempo and a pitch reference tone
#[derive(Parser, Debug)]
#[command(name = "metro")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Metronome with tap tempo and a pitch reference tone", long_about = None)]
pub struct Args {
    /// Tempo in beats per minute
    #[arg(short, long, default_value_t = DEFAULT_BPM,
          value_parser = clap::value_parser!(u16).range(MIN_BPM as i64..=MAX_BPM as i64))]
    pub bpm: u16,

    /// Time signature: 2/4, 3/4, 4/4 or 6/8
    #[arg(short, long, default_value_t = TimeSignature::FOUR_FOUR)]
    pub signature: TimeSignature,

    /// Click sound: classic, wood, electronic or bell
    #[arg(long, default_value_t = SoundType::Classic)]
    pub sound: SoundType,

    /// Click volume from 0.0 to 1.0
    #[arg(short, long, default_value_t = 0.7)]
    pub volume: f32,

    /// Highlight the last beat of each measure as a breathing cue
    #[arg(long)]
    pub breathing_cue: bool,

    /// Print beats to stdout instead of opening the terminal UI
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many beats (headless only)
    #[arg(long, value_name = "N", requires = "headless")]
    pub beats: Option<u64>,

    /// Also sound a reference tone: a note name (A4, C#3, Bb2) or a frequency in Hz
    #[arg(long, value_name = "NOTE|HZ")]
    pub tone: Option<String>,

    /// Reference tone waveform: sine, square, sawtooth or triangle
    #[arg(long, default_value_t = Waveform::Sine)]
    pub waveform: Waveform,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if args.headless {
        app::run_headless(&args)
    } else {
        app::run_tui(&args)
    }
}
