//! Transport bar widget - shows play state, position and a progress gauge

use ratatui::{
    layout::{Constraint, Direction, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use saavy_transpose::engine::TransportState;

use super::View;

fn clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Render the transport bar
pub fn render_transport(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default()
        .title(format!(" {} ", if view.title.is_empty() { "transpose" } else { view.title.as_str() }))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = ratatui::layout::Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let (symbol, label, color) = match view.state {
        TransportState::Playing => ("▶", "Playing", Color::Green),
        TransportState::Paused => ("⏸", "Paused", Color::Yellow),
        TransportState::Ready => ("■", "Ready", Color::White),
        TransportState::Loading => ("…", "Loading", Color::Cyan),
        TransportState::Idle => (" ", "Idle", Color::DarkGray),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {symbol} {label}  "), Style::default().fg(color)),
        Span::styled(
            format!("{} / {}  ", clock(view.position_seconds), clock(view.duration_seconds)),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Tempo: {:.2}x  ", view.tempo),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Gain: {:.1} dB", view.gain_db),
            Style::default().fg(Color::Magenta),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio((view.percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", view.percent));
    frame.render_widget(gauge, rows[1]);
}
