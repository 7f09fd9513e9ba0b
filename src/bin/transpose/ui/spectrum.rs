//! Spectrum widget
//!
//! Draws the analyser's magnitude spectrum on a log-frequency axis.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

const FLOOR_DB: f64 = -100.0;

/// Render the spectrum from (frequency Hz, level dB) pairs
pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    // log10 keeps the low bins from collapsing into the left edge
    let data: Vec<(f64, f64)> = spectrum
        .iter()
        .filter(|(f, _)| *f >= 20.0)
        .map(|&(f, db)| (f.log10(), db.max(FLOOR_DB)))
        .collect();

    let max_x = data.iter().map(|(x, _)| *x).fold(20.0f64.log10(), f64::max);
    let max_db = data.iter().map(|(_, db)| *db).fold(FLOOR_DB, f64::max);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([20.0f64.log10(), max_x.max(20.0f64.log10() + 1.0)])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, max_db.max(0.0) + 10.0])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
