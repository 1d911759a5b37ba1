//! Oscilloscope of the mixed output

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Peak absolute sample value, shown in the title as a level meter.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

pub fn render_waveform(frame: &mut Frame, area: Rect, samples: &[f32]) {
    let level = peak(samples);
    let color = if level >= 1.0 { Color::Red } else { Color::Cyan };
    let block = Block::default()
        .title(format!(" Output  peak {level:.2} "))
        .borders(Borders::ALL);

    let len = samples.len().max(1) as f64;
    let data: Vec<(f64, f64)> = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| (i as f64 / len, s as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
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
