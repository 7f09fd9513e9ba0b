/*
Signal Analysis
===============

The analyser is a tap: it copies the signal passing through it into a ring of
the most recent N samples (N = 256 by default) and leaves the audio untouched.
On request it produces a snapshot for visualisers:

  waveform      The last N samples, oldest first.

  spectrum_db   N/2 magnitude bins from a Hann-windowed FFT, bin k centred
                on k × sample_rate / N Hz.

Magnitudes are normalised so a full-scale sine reads close to 0 dB in its
bin, and floored at -120 dB.

    |X[k]| × 2 / Σ window   →   20 × log₁₀(...)

Pushing samples never allocates. Snapshots allocate, and are meant for the
UI thread, not the audio callback.
*/

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::dsp::amplify::gain_to_db;

pub const DEFAULT_ANALYSER_SIZE: usize = 256;
pub const SPECTRUM_FLOOR_DB: f32 = -120.0;

/// Waveform and spectrum of the most recent analyser window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisSnapshot {
    pub waveform: Vec<f32>,
    pub spectrum_db: Vec<f32>,
}

impl AnalysisSnapshot {
    /// Index of the loudest spectrum bin.
    pub fn peak_bin(&self) -> Option<usize> {
        self.spectrum_db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }
}

pub struct Analyser {
    ring: Vec<f32>,
    write: usize,
    window: Vec<f32>,
    window_sum: f32,
    fft: Arc<dyn Fft<f32>>,
}

impl Analyser {
    /// `size` is rounded up to a power of two, minimum 2.
    pub fn new(size: usize) -> Self {
        let size = size.max(2).next_power_of_two();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        let denom = (size - 1) as f32;
        let window: Vec<f32> = (0..size)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();
        let window_sum = window.iter().sum::<f32>().max(f32::EPSILON);

        Self {
            ring: vec![0.0; size],
            write: 0,
            window,
            window_sum,
            fft,
        }
    }

    pub fn size(&self) -> usize {
        self.ring.len()
    }

    pub fn push(&mut self, samples: &[f32]) {
        let len = self.ring.len();
        for &sample in samples {
            self.ring[self.write] = sample;
            self.write = (self.write + 1) % len;
        }
    }

    pub fn clear(&mut self) {
        self.ring.fill(0.0);
        self.write = 0;
    }

    /// Ring contents in chronological order.
    pub fn waveform(&self) -> Vec<f32> {
        let (newer, older) = self.ring.split_at(self.write);
        older.iter().chain(newer).copied().collect()
    }

    pub fn spectrum_db(&self) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = self
            .waveform()
            .into_iter()
            .zip(&self.window)
            .map(|(s, w)| Complex::new(s * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        let half = buffer.len() / 2;
        buffer[..half]
            .iter()
            .map(|bin| {
                let magnitude = bin.norm() * 2.0 / self.window_sum;
                gain_to_db(magnitude).max(SPECTRUM_FLOOR_DB)
            })
            .collect()
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        AnalysisSnapshot {
            waveform: self.waveform(),
            spectrum_db: self.spectrum_db(),
        }
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new(DEFAULT_ANALYSER_SIZE)
    }
}
