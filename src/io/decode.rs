use std::io::Cursor;
use std::sync::Arc;

use crate::error::DecodeError;

/// Immutable mono samples plus the rate they were recorded at.
///
/// Cloning is cheap: the samples are shared.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
}

impl DecodedBuffer {
    /// Decode WAV bytes. Multichannel audio is mixed down to mono.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                if spec.bits_per_sample != 32 {
                    return Err(DecodeError::UnsupportedFormat(format!(
                        "{}-bit float",
                        spec.bits_per_sample
                    )));
                }
                reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?
            }
            hound::SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(DecodeError::UnsupportedFormat(format!(
                        "{}-bit integer",
                        spec.bits_per_sample
                    )));
                }
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let channels = spec.channels.max(1);
        let mono = downmix(&interleaved, channels);
        if mono.is_empty() {
            return Err(DecodeError::Empty);
        }

        log::debug!(
            "decoded {} frames at {} Hz ({} channels)",
            mono.len(),
            spec.sample_rate,
            channels
        );
        Ok(Self {
            samples: mono.into(),
            sample_rate: spec.sample_rate,
            channels,
        })
    }

    /// Wrap already-decoded mono samples.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
        }
    }

    pub fn samples(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count of the original recording.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
