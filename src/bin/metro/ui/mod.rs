//! Terminal UI for metro
//!
//! One loop on the main thread: drain beat events, log lines and monitor
//! samples, draw, then poll the keyboard for at most one frame.

mod beats;
pub mod state;
mod spectrum;
mod tone;
mod transport;
mod waveform;

use std::{
    sync::mpsc::Receiver,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::Level;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use saavy_metronome::{
    metronome::{Metronome, MetronomeEvent},
    output::AudioContext,
    tone::ToneGenerator,
};

use crate::logger::LogLine;
use beats::render_beats;
use spectrum::{render_spectrum, SpectrumAnalyzer};
use state::UiState;
use tone::render_tone;
use transport::{render_transport, AudioStats};
use waveform::render_waveform;

/// Samples kept for the oscilloscope and the FFT
const VIS_BUFFER_SIZE: usize = 2048;
/// Samples actually drawn by the oscilloscope
const SCOPE_WINDOW: usize = 512;
const VOLUME_STEP: f32 = 0.05;

const HELP: &str = concat!(
    " [Space] Start/Stop  [↑↓] ±1  [←→] ±5  [T] Tap  [S] Meter  [M] Sound  [+-] Volume  ",
    "[B] Breath  [G] Tone  [[ ]] Semitone  [W] Wave  [Q] Quit",
);

pub struct UiApp {
    metronome: Metronome,
    tone: ToneGenerator,
    context: AudioContext,
    events: Receiver<MetronomeEvent>,
    logs: Receiver<LogLine>,
    monitor: Consumer<f32>,
    audio_buffer: Vec<f32>,
    spectrum: Option<SpectrumAnalyzer>,
    state: UiState,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        metronome: Metronome,
        tone: ToneGenerator,
        context: AudioContext,
        events: Receiver<MetronomeEvent>,
        logs: Receiver<LogLine>,
        monitor: Consumer<f32>,
    ) -> Self {
        Self {
            metronome,
            tone,
            context,
            events,
            logs,
            monitor,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: None,
            state: UiState::default(),
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            let now = Instant::now();
            self.poll_events(now);
            self.poll_audio();

            terminal.draw(|frame| self.render(frame, now))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.metronome.stop();
        self.tone.stop();
        Ok(())
    }

    fn poll_events(&mut self, now: Instant) {
        while let Ok(event) = self.events.try_recv() {
            self.state.apply(event, now);
        }
        while let Ok(line) = self.logs.try_recv() {
            self.state.log(line, now);
        }
    }

    /// Append new monitor samples, keeping the last VIS_BUFFER_SIZE.
    fn poll_audio(&mut self) {
        let available = self.monitor.slots();
        if available > 0 {
            if let Ok(chunk) = self.monitor.read_chunk(available) {
                self.audio_buffer.extend(chunk);
            }
            let excess = self.audio_buffer.len().saturating_sub(VIS_BUFFER_SIZE);
            self.audio_buffer.drain(..excess);
        }

        if self.spectrum.is_none() {
            self.spectrum = self
                .context
                .sample_rate()
                .map(|rate| SpectrumAnalyzer::new(VIS_BUFFER_SIZE, rate));
        }
        if let Some(spectrum) = self.spectrum.as_mut() {
            spectrum.update(&self.audio_buffer);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.state.notice.take().is_some() {
            return;
        }

        let tempo = self.metronome.tempo();
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => {
                if let Err(err) = self.metronome.toggle() {
                    self.state.notice = Some(format!("Audio unavailable: {err}"));
                }
            }
            KeyCode::Up => self.metronome.adjust_bpm(1),
            KeyCode::Down => self.metronome.adjust_bpm(-1),
            KeyCode::Right => self.metronome.adjust_bpm(5),
            KeyCode::Left => self.metronome.adjust_bpm(-5),
            KeyCode::Char('t') | KeyCode::Char('T') => {
                self.metronome.tap();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.metronome.set_time_signature(tempo.time_signature.next())
            }
            KeyCode::Char('m') | KeyCode::Char('M') => self.metronome.set_sound(tempo.sound.next()),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.metronome.set_volume(tempo.volume() + VOLUME_STEP)
            }
            KeyCode::Char('-') => self.metronome.set_volume(tempo.volume() - VOLUME_STEP),
            KeyCode::Char('b') | KeyCode::Char('B') => {
                self.metronome.set_breathing_cue(!tempo.breathing_cue)
            }
            KeyCode::Char('g') | KeyCode::Char('G') => self.toggle_tone(),
            KeyCode::Char('[') => self.tone.transpose(-1),
            KeyCode::Char(']') => self.tone.transpose(1),
            KeyCode::Char('w') | KeyCode::Char('W') => {
                let waveform = self.tone.settings().waveform.next();
                self.tone.set_waveform(waveform);
            }
            _ => {}
        }
    }

    pub fn toggle_tone(&mut self) {
        if let Err(err) = self.tone.toggle() {
            self.state.notice = Some(format!("Audio unavailable: {err}"));
        }
    }

    fn render(&self, frame: &mut Frame, now: Instant) {
        let area = frame.area();
        let tempo = self.metronome.tempo();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Transport bar
                Constraint::Length(5), // Beats
                Constraint::Length(3), // Tone
                Constraint::Min(8),    // Scope + spectrum
                Constraint::Length(1), // Status
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_transport(
            frame,
            chunks[0],
            &tempo,
            self.metronome.is_running(),
            self.context.sample_rate(),
            &stats,
        );
        render_beats(frame, chunks[1], &tempo, &self.state, now);
        render_tone(frame, chunks[2], &self.tone.settings(), self.tone.is_playing());

        let views = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[3]);
        render_waveform(frame, views[0], &self.audio_buffer, SCOPE_WINDOW);
        match &self.spectrum {
            Some(spectrum) => {
                let tone_hz = self.tone.is_playing().then(|| self.tone.settings().frequency);
                render_spectrum(frame, views[1], spectrum, tone_hz);
            }
            None => {
                let idle = Paragraph::new(" starts with the audio output")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().title(" Spectrum ").borders(Borders::ALL));
                frame.render_widget(idle, views[1]);
            }
        }

        if let Some(line) = self.state.status(now) {
            let color = match line.level {
                Level::Error => Color::Red,
                Level::Warn => Color::Yellow,
                _ => Color::Gray,
            };
            frame.render_widget(
                Paragraph::new(format!(" {}", line.message)).style(Style::default().fg(color)),
                chunks[4],
            );
        }

        frame.render_widget(
            Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
            chunks[5],
        );

        if let Some(notice) = &self.state.notice {
            render_notice(frame, area, notice);
        }
    }
}

fn render_notice(frame: &mut Frame, area: Rect, message: &str) {
    let width = area.width.min(60);
    let height = 5.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
    let text = vec![Line::raw(message.to_string()), Line::raw("press any key")];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}
