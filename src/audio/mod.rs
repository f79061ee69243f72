pub mod segment;
pub mod threshold;

pub use segment::segment;
pub use threshold::estimate_threshold_db;

use std::path::Path;
use std::time::Duration;

use hound::WavReader;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AvchunkError, Result};

/// Decoded mono PCM audio for one segmentation run.
///
/// Read-only once loaded. The samples come from the external extraction
/// step (conceptually ffmpeg output); this crate never decodes containers
/// itself.
#[derive(Debug, Clone)]
pub struct Waveform {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap pre-decoded samples. An empty waveform or a zero sample rate
    /// is a contract violation on the upstream extraction step.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(AvchunkError::Contract(
                "waveform has zero samples".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(AvchunkError::Contract(
                "waveform sample rate is zero".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Load a waveform from a WAV file, downmixing to mono if needed.
    pub fn from_wav_file(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        info!(
            "Loading audio: {} Hz, {} channels, {} bits",
            spec.sample_rate, spec.channels, spec.bits_per_sample
        );

        let raw: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .into_samples::<i16>()
                .map(|s| s.unwrap_or(0))
                .collect(),
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| (s.unwrap_or(0.0) * i16::MAX as f32) as i16)
                .collect(),
        };

        let samples = if spec.channels <= 1 {
            raw
        } else {
            debug!("Downmixing {} channels to mono", spec.channels);
            raw.chunks(spec.channels as usize)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / frame.len() as i32) as i16
                })
                .collect()
        };

        Self::new(samples, spec.sample_rate)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// Number of samples in `ms` milliseconds at this sample rate.
    pub(crate) fn samples_per_ms_span(&self, ms: u64) -> usize {
        (self.sample_rate as u64 * ms / 1000) as usize
    }
}

/// A coarse sound-containing time range produced by silence detection,
/// before face-based refinement. Half-open: `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInterval {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl CandidateInterval {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn duration_sec(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }

    pub fn start_sec(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn end_sec(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }
}
