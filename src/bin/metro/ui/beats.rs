//! Beat indicator - one cell per beat of the measure

use std::time::Instant;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_metronome::metronome::TempoState;

use super::state::UiState;

pub fn render_beats(
    frame: &mut Frame,
    area: Rect,
    tempo: &TempoState,
    state: &UiState,
    now: Instant,
) {
    let tap = if state.tap_lit(now) {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let tap_label = match state.tap_bpm {
        Some(bpm) => format!(" tap {bpm} "),
        None => " tap ".to_string(),
    };

    let block = Block::default()
        .title(" Beats ")
        .title_bottom(Line::styled(tap_label, tap).right_aligned())
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let signature = tempo.time_signature;
    let beats = signature.beats();
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, beats as u32); beats])
        .split(inner);

    // The highlight follows the meter the beat was counted in; a beat from
    // before a meter switch is not shown against the new measure.
    let current = state
        .beat
        .filter(|beat| beat.beats == beats)
        .map(|beat| beat.index);
    let lit = state.beat_lit(now);

    for (index, cell) in cells.iter().enumerate() {
        let number = index + 1;
        let accent = signature.is_accent(number);
        let breath = tempo.breathing_cue && number == beats;

        let base = match (accent, breath) {
            (true, _) => Color::Red,
            (false, true) => Color::Blue,
            _ => Color::Gray,
        };
        let style = if current == Some(index) {
            let style = Style::default().fg(Color::Black).bg(base).add_modifier(Modifier::BOLD);
            if lit {
                style
            } else {
                style.add_modifier(Modifier::DIM)
            }
        } else {
            Style::default().fg(base)
        };

        let label = if accent { format!("[{number}]") } else { format!(" {number} ") };
        let paragraph = Paragraph::new(label)
            .style(style)
            .alignment(ratatui::layout::Alignment::Center);
        frame.render_widget(paragraph, *cell);
    }
}
