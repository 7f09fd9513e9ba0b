//! Player - audio stream, loader thread and deck wiring

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rtrb::RingBuffer;

use saavy_transpose::{
    engine::{LoadRequest, LoadToken, SystemClock},
    error::LoadError,
    harmonic::{MemorySongStore, SongId, SongRecord},
    io::{AudioSource, DecodedBuffer, FileFetcher, SourceFetcher},
    key::{calculate_semitones, normalize_key, transpose_key_with},
    Deck, StudioConfig, MAX_BLOCK_SIZE,
};

use super::ui::UiApp;
use super::Args;

pub type SharedDeck = Arc<Mutex<Deck<SystemClock, MemorySongStore>>>;

/// Samples buffered for the scope between UI frames.
const SCOPE_RING_SIZE: usize = 8192;

/// A fetch + decode job for the loader thread.
pub struct LoadJob {
    pub token: LoadToken,
    pub source: AudioSource,
}

pub struct LoadResult {
    pub token: LoadToken,
    pub result: Result<DecodedBuffer, LoadError>,
}

pub struct Player {
    args: Args,
    config: StudioConfig,
}

impl Player {
    pub fn new(args: Args, config: StudioConfig) -> Self {
        Self { args, config }
    }

    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        log::info!("output {} Hz, {} channels", sample_rate, channels);

        let song = song_from_args(&self.args, &self.config);
        let id = song.id.clone();
        let store: MemorySongStore = std::iter::once(song).collect();
        let deck: SharedDeck = Arc::new(Mutex::new(Deck::from_config(
            SystemClock::new(),
            &self.config,
            sample_rate,
            store,
        )));

        let (job_tx, job_rx) = unbounded::<LoadJob>();
        let (result_tx, result_rx) = unbounded::<LoadResult>();
        let loader = spawn_loader(job_rx, result_tx);

        {
            let mut deck = deck.lock().map_err(|_| eyre!("deck lock poisoned"))?;
            let (request, source) = deck.begin_song(&id)?;
            if let LoadRequest::Started(token) = request {
                job_tx.send(LoadJob { token, source })?;
            }
        }

        // Scope samples flow to the UI through a lock-free ring
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_RING_SIZE);

        let audio_deck = Arc::clone(&deck);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                // Never block the audio thread on the UI
                let mut deck = audio_deck.try_lock().ok();

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];

                    match deck.as_mut() {
                        Some(deck) => deck.engine_mut().render_block(block),
                        None => block.fill(0.0),
                    }

                    for &s in block.iter() {
                        let _ = scope_tx.push(s);
                    }

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| log::error!("audio stream error: {}", err),
            None,
        )?;

        stream.play()?;

        let mut terminal = ratatui::init();
        let outcome = UiApp::new(Arc::clone(&deck), scope_rx, job_tx, result_rx, sample_rate)
            .run(&mut terminal);
        ratatui::restore();

        drop(stream);
        if let Ok(mut deck) = deck.lock() {
            deck.end_session();
        }
        let _ = loader.join();
        outcome
    }
}

/// Fetch and decode on a worker until the job channel closes.
fn spawn_loader(jobs: Receiver<LoadJob>, results: Sender<LoadResult>) -> JoinHandle<()> {
    thread::spawn(move || {
        let fetcher = FileFetcher;
        for job in jobs {
            log::debug!("loader: fetching {}", job.source);
            let result = fetcher
                .fetch(&job.source)
                .map_err(LoadError::from)
                .and_then(|bytes| DecodedBuffer::from_wav_bytes(&bytes).map_err(LoadError::from));
            if results
                .send(LoadResult {
                    token: job.token,
                    result,
                })
                .is_err()
            {
                break;
            }
        }
    })
}

/// Describe the file on the command line as a song record.
fn song_from_args(args: &Args, config: &StudioConfig) -> SongRecord {
    let preference = config.sync.key_preference;
    let title = args
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string());
    let original = args
        .key
        .as_deref()
        .map(|k| normalize_key(k).to_string())
        .unwrap_or_else(|| "C".to_string());

    let (pitch, target) = match (args.pitch, args.target.as_deref()) {
        (Some(pitch), _) => (pitch, transpose_key_with(&original, pitch, preference).to_string()),
        (None, Some(target)) => (
            calculate_semitones(&original, target),
            normalize_key(target).to_string(),
        ),
        (None, None) => (0, original.clone()),
    };

    SongRecord {
        id: SongId::new(title.clone()),
        title,
        audio_url: Some(AudioSource::from(args.path.as_path())),
        original_key: Some(original),
        target_key: Some(target),
        pitch,
        ..SongRecord::default()
    }
}
