//! TUI module for transpose
//!
//! Draws transport, key and analysis panels and maps keys onto the deck.

mod harmonic;
mod spectrum;
mod transport;
mod waveform;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use saavy_transpose::{
    engine::{EngineEvent, LoadRequest, TickOutcome, TransportState},
    harmonic::{LinkState, OctaveShift},
    key::Key,
};

use super::app::{LoadJob, LoadResult, SharedDeck};

use harmonic::render_harmonic;
use spectrum::render_spectrum;
use transport::render_transport;
use waveform::render_waveform;

/// Scope window length in samples
const SCOPE_SIZE: usize = 1024;
const SEEK_STEP: f64 = 5.0;
const TEMPO_STEP: f32 = 0.05;

/// Everything a frame draws, copied out of the deck under one lock.
#[derive(Clone, Debug, Default)]
pub struct View {
    pub title: String,
    pub state: TransportState,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub percent: f64,
    pub tempo: f32,
    pub gain_db: f32,
    pub original_key: String,
    pub target_key: String,
    pub pitch: i32,
    pub link: Option<LinkState>,
    /// (frequency Hz, level dB)
    pub spectrum: Vec<(f64, f64)>,
}

pub struct UiApp {
    deck: SharedDeck,
    scope_rx: Consumer<f32>,
    jobs: Sender<LoadJob>,
    results: Receiver<LoadResult>,
    sample_rate: f32,
    scope: Vec<f32>,
    view: View,
    status: Option<String>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        deck: SharedDeck,
        scope_rx: Consumer<f32>,
        jobs: Sender<LoadJob>,
        results: Receiver<LoadResult>,
        sample_rate: f32,
    ) -> Self {
        Self {
            deck,
            scope_rx,
            jobs,
            results,
            sample_rate,
            scope: vec![0.0; SCOPE_SIZE],
            view: View::default(),
            status: Some("loading...".to_string()),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();
            self.update();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn poll_scope(&mut self) {
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
        }
        if self.scope.len() > SCOPE_SIZE {
            let excess = self.scope.len() - SCOPE_SIZE;
            self.scope.drain(0..excess);
        }
    }

    /// Commit finished loads, drive the progress clock and refresh the view.
    fn update(&mut self) {
        let Ok(mut deck) = self.deck.lock() else {
            self.should_quit = true;
            return;
        };

        while let Ok(done) = self.results.try_recv() {
            if let Err(err) = deck.engine_mut().finish_load(done.token, done.result) {
                self.status = Some(format!("audio unavailable: {err}"));
            }
        }

        if let Some(TickOutcome::Ended) = deck.engine_mut().poll() {
            log::debug!("end of media");
        }
        for event in deck.engine_mut().drain_events() {
            self.status = match event {
                EngineEvent::Loaded { duration_seconds, .. } => {
                    Some(format!("loaded {duration_seconds:.1}s"))
                }
                EngineEvent::LoadFailed { message, .. } => Some(format!("audio unavailable: {message}")),
                EngineEvent::Ended => Some("end of song".to_string()),
                EngineEvent::Stopped => None,
            };
        }

        let engine = deck.engine();
        let progress = engine.progress();
        let song = deck.current_song();
        let effective = deck.effective();
        let bin_hz = engine
            .analysis()
            .map(|a| {
                let size = (a.spectrum_db.len() * 2).max(1) as f64;
                let hz = self.sample_rate as f64 / size;
                a.spectrum_db
                    .iter()
                    .enumerate()
                    .skip(1)
                    .map(|(i, &db)| (i as f64 * hz, db as f64))
                    .collect()
            })
            .unwrap_or_default();

        self.view = View {
            title: song.as_ref().map(|s| s.title.clone()).unwrap_or_default(),
            state: engine.state(),
            position_seconds: progress.position_seconds,
            duration_seconds: progress.duration_seconds,
            percent: progress.progress_percent(),
            tempo: engine.current_tempo(),
            gain_db: engine.parameters().gain_db,
            original_key: song.as_ref().map(|s| s.original_key().to_string()).unwrap_or_default(),
            target_key: effective
                .map(|t| t.target_key.to_string())
                .unwrap_or_else(|| Key::TBC.to_string()),
            pitch: effective.map(|t| t.pitch).unwrap_or(0),
            link: deck.link_state(),
            spectrum: bin_hz,
        };
    }

    /// Handle keyboard input
    fn handle_key(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
            self.should_quit = true;
            return;
        }

        let Ok(mut deck) = self.deck.lock() else {
            self.should_quit = true;
            return;
        };
        let pitch = self.view.pitch;
        let linked = self.view.link != Some(LinkState::Unlinked);

        let result: Result<(), String> = match key {
            KeyCode::Char(' ') => deck.engine_mut().toggle_playback().map_err(|e| e.to_string()),
            KeyCode::Char('s') | KeyCode::Char('S') => deck.engine_mut().stop().map_err(|e| e.to_string()),
            KeyCode::Left | KeyCode::Right => {
                let step = if key == KeyCode::Left { -SEEK_STEP } else { SEEK_STEP };
                let target = (self.view.percent + step).clamp(0.0, 100.0);
                deck.engine_mut().seek(target).map_err(|e| e.to_string())
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                deck.set_pitch(pitch + 1).map(|_| ()).map_err(|e| e.to_string())
            }
            KeyCode::Char('-') => deck.set_pitch(pitch - 1).map(|_| ()).map_err(|e| e.to_string()),
            KeyCode::Char('O') => deck.shift_octave(OctaveShift::Up).map(|_| ()).map_err(|e| e.to_string()),
            KeyCode::Char('o') => deck.shift_octave(OctaveShift::Down).map(|_| ()).map_err(|e| e.to_string()),
            KeyCode::Char(']') | KeyCode::Char('[') => {
                let step = if key == KeyCode::Char(']') { TEMPO_STEP } else { -TEMPO_STEP };
                let tempo = ((self.view.tempo + step) * 100.0).round() / 100.0;
                deck.engine_mut().set_tempo(tempo).map_err(|e| e.to_string())
            }
            KeyCode::Char('k') | KeyCode::Char('K') => {
                let preference = deck.sync().policy().key_preference;
                let next = deck
                    .effective()
                    .map(|t| t.target_key.transposed(1, preference).to_string());
                match next {
                    Some(next) => deck.set_target_key(&next).map(|_| ()).map_err(|e| e.to_string()),
                    None => Err("no song loaded".to_string()),
                }
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                deck.set_is_pitch_linked(!linked).map(|_| ()).map_err(|e| e.to_string())
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload(&mut deck),
            _ => Ok(()),
        };

        match result {
            Ok(()) => {}
            Err(message) => {
                log::warn!("{message}");
                self.status = Some(message);
            }
        }
    }

    /// Reload the current song from disk on the loader thread.
    fn reload(
        &self,
        deck: &mut saavy_transpose::Deck<saavy_transpose::engine::SystemClock, saavy_transpose::harmonic::MemorySongStore>,
    ) -> Result<(), String> {
        let id = deck.current_id().cloned().ok_or_else(|| "no song loaded".to_string())?;
        deck.unload();
        let (request, source) = deck.begin_song(&id).map_err(|e| e.to_string())?;
        if let LoadRequest::Started(token) = request {
            self.jobs
                .send(LoadJob { token, source })
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Transport bar + progress
                Constraint::Length(4), // Key panel
                Constraint::Min(8),    // Spectrum
                Constraint::Length(8), // Scope
                Constraint::Length(1), // Status / help
            ])
            .split(area);

        render_transport(frame, chunks[0], &self.view);
        render_harmonic(frame, chunks[1], &self.view);
        render_spectrum(frame, chunks[2], &self.view.spectrum);
        render_waveform(frame, chunks[3], &self.scope);

        let footer = match &self.status {
            Some(status) => Paragraph::new(format!(" {status}")).style(Style::default().fg(Color::Yellow)),
            None => Paragraph::new(
                " [Space] Play/Pause  [S] Stop  [←/→] Seek  [+/-] Pitch  [O/o] Octave  [ [/] ] Tempo  [K] Key  [L] Link  [R] Reload  [Q] Quit",
            )
            .style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(footer, chunks[4]);
    }
}
