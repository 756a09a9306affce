//! Reference tone panel

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_metronome::{pitch, voices::ToneSettings};

pub fn render_tone(frame: &mut Frame, area: Rect, settings: &ToneSettings, playing: bool) {
    let block = Block::default().title(" Tone ").borders(Borders::ALL);

    let (note, cents) = pitch::nearest_note(settings.frequency);
    let (state, color) = if playing { ("on ", Color::Green) } else { ("off", Color::DarkGray) };

    let line = Line::from(vec![
        Span::styled(format!(" {state}  "), Style::default().fg(color)),
        Span::styled(format!("{note:<4}"), Style::default().fg(Color::Cyan)),
        Span::styled(format!("{cents:+3}c  "), Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{:.2} Hz  ", settings.frequency)),
        Span::raw(format!("{}  ", settings.waveform)),
        Span::raw(format!("vol {:.0}%", settings.volume * 100.0)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
