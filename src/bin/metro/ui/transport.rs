//! Transport bar - play state, tempo, meter, sound and output level

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_metronome::metronome::TempoState;

/// Output level over the visible window
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    tempo: &TempoState,
    running: bool,
    sample_rate: Option<f32>,
    stats: &AudioStats,
) {
    let block = Block::default().title(" metro ").borders(Borders::ALL);

    let (symbol, label, color) = if running {
        ("▶", "Playing", Color::Green)
    } else {
        ("■", "Stopped", Color::Yellow)
    };

    let mut spans = vec![
        Span::styled(format!(" {symbol} {label}  "), Style::default().fg(color)),
        Span::styled(
            format!("{} BPM  ", tempo.bpm()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{}  ", tempo.time_signature), Style::default().fg(Color::White)),
        Span::styled(format!("{}  ", tempo.sound), Style::default().fg(Color::White)),
        Span::styled(
            format!("vol {:>3.0}%  ", tempo.volume() * 100.0),
            Style::default().fg(Color::White),
        ),
    ];

    if tempo.breathing_cue {
        spans.push(Span::styled("breath cue  ", Style::default().fg(Color::Blue)));
    }

    if let Some(rate) = sample_rate {
        spans.push(Span::styled(
            format!("{:.1}kHz  ", rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
        Style::default().fg(Color::Magenta),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
