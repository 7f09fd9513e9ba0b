//! Key panel - original key, target key, pitch and link state

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use saavy_transpose::harmonic::LinkState;

use super::View;

pub fn render_harmonic(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" Key ").borders(Borders::ALL);

    let link = match view.link {
        Some(LinkState::Linked) => ("linked", Color::Green),
        Some(LinkState::Unlinked) => ("unlinked", Color::Yellow),
        Some(LinkState::SessionLocked) => ("stage key locked", Color::Red),
        None => ("-", Color::DarkGray),
    };

    let keys = Line::from(vec![
        Span::styled(format!(" {}", view.original_key), Style::default().fg(Color::White)),
        Span::styled("  →  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            view.target_key.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("   Pitch: {:+}", view.pitch), Style::default().fg(Color::White)),
    ]);
    let state = Line::from(Span::styled(format!(" {}", link.0), Style::default().fg(link.1)));

    frame.render_widget(Paragraph::new(vec![keys, state]).block(block), area);
}
