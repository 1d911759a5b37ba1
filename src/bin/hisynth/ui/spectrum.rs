//! Spectrum of the mixed output
//!
//! Hann-windowed FFT read out at log-spaced frequencies, plotted against
//! log10(Hz) so each octave gets the same width.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const SPECTRUM_POINTS: usize = 64;
const MIN_FREQ: f32 = 20.0;
const MAX_FREQ: f32 = 20_000.0;
const FLOOR_DB: f64 = -100.0;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    /// FFT bin read for each plotted point
    bins: Vec<usize>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (log10 Hz, dB)
    points: Vec<(f64, f64)>,
    /// Frequency of the loudest plotted point
    dominant: Option<f64>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_len: usize, sample_rate: f32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_len);

        let denom = fft_len.saturating_sub(1).max(1) as f32;
        let window = (0..fft_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let nyquist = (sample_rate / 2.0).min(MAX_FREQ).max(MIN_FREQ + 1.0);
        let last_bin = (fft_len / 2).saturating_sub(1);
        let ratio = nyquist / MIN_FREQ;
        let (bins, points) = (0..SPECTRUM_POINTS)
            .map(|i| {
                let t = i as f32 / (SPECTRUM_POINTS - 1) as f32;
                let freq = MIN_FREQ * ratio.powf(t);
                let bin = ((freq * fft_len as f32 / sample_rate).round() as usize).min(last_bin);
                (bin, ((freq as f64).log10(), FLOOR_DB))
            })
            .unzip();

        Self {
            window,
            bins,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_len],
            points,
            dominant: None,
        }
    }

    /// Analyze `samples`; ignored unless it holds exactly one FFT frame.
    pub fn update(&mut self, samples: &[f32]) {
        if samples.len() != self.window.len() {
            return;
        }
        for ((slot, &s), &w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let mut loudest = (FLOOR_DB, None);
        for (point, &bin) in self.points.iter_mut().zip(&self.bins) {
            let power = self.scratch[bin].norm_sqr().max(1e-12) as f64;
            point.1 = (10.0 * power.log10()).max(FLOOR_DB);
            if point.1 > loudest.0 {
                loudest = (point.1, Some(10f64.powf(point.0)));
            }
        }
        self.dominant = loudest.1;
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn dominant(&self) -> Option<f64> {
        self.dominant
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, analyzer: &SpectrumAnalyzer) {
    let title = match analyzer.dominant() {
        Some(freq) => format!(" Spectrum  ~{freq:.0} Hz "),
        None => " Spectrum ".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(analyzer.points());

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([(MIN_FREQ as f64).log10(), (MAX_FREQ as f64).log10()])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 20.0])
                .labels(vec!["-100", "-40", "20"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
