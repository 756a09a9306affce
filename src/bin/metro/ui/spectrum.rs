//! Spectrum of the output mix
//!
//! FFT over the oscilloscope buffer, read out at log-spaced frequencies so
//! the click partials and the reference tone share one readable axis.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

const SPECTRUM_BINS: usize = 64;
const MIN_FREQ: f64 = 50.0;
const FLOOR_DB: f64 = -100.0;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    /// log10 of each display frequency, the chart's x coordinate
    log_freqs: Vec<f64>,
    bin_indices: Vec<usize>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (log10 Hz, dB) per display bin
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    /// `buffer_len` is the FFT size and must match the buffers passed to
    /// [`update`](Self::update).
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(buffer_len);

        // Hann window
        let window: Vec<f32> = (0..buffer_len)
            .map(|i| {
                if buffer_len > 1 {
                    let denom = (buffer_len - 1) as f32;
                    0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos())
                } else {
                    1.0
                }
            })
            .collect();

        let max_freq = (sample_rate as f64 / 2.0).min(20_000.0).max(MIN_FREQ * 2.0);
        let half = (buffer_len / 2).max(1);
        let (log_freqs, bin_indices): (Vec<f64>, Vec<usize>) = (0..SPECTRUM_BINS)
            .map(|i| {
                let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
                let freq = MIN_FREQ * (max_freq / MIN_FREQ).powf(t);
                let index = (freq * buffer_len as f64 / sample_rate as f64).round() as usize;
                (freq.log10(), index.min(half - 1))
            })
            .unzip();

        let spectrum = log_freqs.iter().map(|&f| (f, FLOOR_DB)).collect();

        Self {
            window,
            log_freqs,
            bin_indices,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); buffer_len],
            spectrum,
        }
    }

    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        // Normalise so a full-scale sine reads near 0 dB.
        let norm = (self.window.len() as f32 / 4.0).powi(2);
        for ((point, &index), &log_freq) in
            self.spectrum.iter_mut().zip(&self.bin_indices).zip(&self.log_freqs)
        {
            let power = (self.scratch[index].norm_sqr() / norm).max(1e-12);
            *point = (log_freq, (10.0 * (power as f64).log10()).max(FLOOR_DB));
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }

    pub fn bounds(&self) -> [f64; 2] {
        let first = self.log_freqs.first().copied().unwrap_or(0.0);
        let last = self.log_freqs.last().copied().unwrap_or(1.0);
        [first, last.max(first + 0.1)]
    }
}

/// Draw the spectrum, with a marker at `tone_hz` when the reference tone sounds.
pub fn render_spectrum(
    frame: &mut Frame,
    area: Rect,
    analyzer: &SpectrumAnalyzer,
    tone_hz: Option<f32>,
) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let marker: Vec<(f64, f64)> = tone_hz
        .map(|hz| {
            let x = (hz as f64).log10();
            vec![(x, FLOOR_DB), (x, 0.0)]
        })
        .unwrap_or_default();

    let mut datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(analyzer.data())];
    if !marker.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Yellow))
                .data(&marker),
        );
    }

    let [low, high] = analyzer.bounds();
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([low, high])
                .labels(vec![
                    Span::raw(format!("{:.0}", 10f64.powf(low))),
                    Span::raw("1k"),
                    Span::raw(format!("{:.0}k", 10f64.powf(high) / 1000.0)),
                ])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
