//! Oscilloscope of the output mix

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Plot the most recent `window` samples, starting at a rising zero crossing
/// when one exists so a steady tone stands still between frames.
pub fn render_waveform(frame: &mut Frame, area: Rect, buffer: &[f32], window: usize) {
    let block = Block::default().title(" Output ").borders(Borders::ALL);

    let window = window.min(buffer.len());
    let search = &buffer[..buffer.len() - window];
    let start = search
        .windows(2)
        .rposition(|pair| pair[0] <= 0.0 && pair[1] > 0.0)
        .map(|i| i + 1)
        .unwrap_or(buffer.len() - window);

    let data: Vec<(f64, f64)> = buffer[start..start + window]
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / window.max(1) as f64, sample as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
