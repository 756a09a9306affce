//! Wiring between the command line, the widgets and the two front-ends.

use std::sync::mpsc;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use log::info;

use saavy_metronome::{
    metronome::{Metronome, MetronomeBuilder, MetronomeEvent},
    output::AudioContext,
    pitch,
    tone::ToneGenerator,
    voices::ToneSettings,
};

use crate::{logger, ui::UiApp, Args};

/// Samples buffered between the audio callback and the oscilloscope.
const MONITOR_CAPACITY: usize = 8192;

fn metronome_builder(args: &Args) -> MetronomeBuilder {
    Metronome::builder()
        .bpm(args.bpm)
        .time_signature(args.signature)
        .sound(args.sound)
        .volume(args.volume)
        .breathing_cue(args.breathing_cue)
}

fn tone_settings(args: &Args) -> EyreResult<ToneSettings> {
    let frequency = match &args.tone {
        Some(input) => pitch::parse_tone(input).wrap_err("invalid --tone")?,
        None => ToneSettings::default().frequency,
    };
    Ok(ToneSettings {
        frequency,
        waveform: args.waveform,
        ..ToneSettings::default()
    })
}

/// Plain stdout mode: one line per beat, logs through env_logger.
pub fn run_headless(args: &Args) -> EyreResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let context = AudioContext::new();
    let (tx, rx) = mpsc::channel();
    let mut metronome = metronome_builder(args)
        .listener(move |event| {
            let _ = tx.send(event);
        })
        .build(context.clone());

    let mut tone = ToneGenerator::with_settings(context.clone(), tone_settings(args)?);
    if args.tone.is_some() {
        tone.start().wrap_err("failed to start the reference tone")?;
    }

    let tempo = metronome.tempo();
    info!(
        "{} BPM, {}, {} click, volume {:.0}%",
        tempo.bpm(),
        tempo.time_signature,
        tempo.sound,
        tempo.volume() * 100.0
    );
    metronome.start().wrap_err("failed to start the metronome")?;

    let mut played = 0u64;
    for event in rx {
        let MetronomeEvent::Beat(beat) = event else {
            continue;
        };
        played += 1;

        let marks: String = (0..beat.beats)
            .map(|i| match (i == beat.index, i == beat.index && beat.accent) {
                (true, true) => '●',
                (true, false) => '○',
                _ => '·',
            })
            .collect();
        println!(
            "{played:>5}  {marks}  beat {}/{}{}",
            beat.number(),
            beat.beats,
            if beat.breath { "  breathe" } else { "" }
        );

        if args.beats.is_some_and(|limit| played >= limit) {
            break;
        }
    }

    metronome.stop();
    tone.stop();
    Ok(())
}

/// Full-screen terminal UI. Logs are routed to its status line.
pub fn run_tui(args: &Args) -> EyreResult<()> {
    let logs = logger::init_tui_logger();

    let (context, monitor) = AudioContext::with_monitor(MONITOR_CAPACITY);
    let (tx, events) = mpsc::channel();
    let metronome = metronome_builder(args)
        .listener(move |event| {
            let _ = tx.send(event);
        })
        .build(context.clone());
    let tone = ToneGenerator::with_settings(context.clone(), tone_settings(args)?);

    let mut app = UiApp::new(metronome, tone, context, events, logs, monitor);
    if args.tone.is_some() {
        app.toggle_tone();
    }

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}
