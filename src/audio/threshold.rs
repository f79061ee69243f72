//! Dynamic silence-threshold estimation.
//!
//! Combines a statistical noise-floor estimate (5th percentile of
//! short-time frame levels) with the preset's offset from the waveform's
//! overall dBFS level. A user-supplied custom threshold bypasses the
//! estimation entirely.

use tracing::debug;

use crate::audio::Waveform;
use crate::config::SilenceConfig;

/// Clamp floor so degenerate (all-zero) waveforms still yield a finite
/// threshold instead of -inf.
pub const DB_FLOOR: f64 = -90.0;

/// Non-overlapping RMS analysis frame length.
const RMS_FRAME_MS: u64 = 20;

const NOISE_FLOOR_PERCENTILE: f64 = 0.05;

/// Calculate RMS energy of a sample window, normalized to [0, 1].
pub(crate) fn calculate_rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = s as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    (sum_squares / samples.len() as f64).sqrt()
}

/// Convert a normalized RMS value to dBFS, clamped to [`DB_FLOOR`].
pub(crate) fn rms_to_dbfs(rms: f64) -> f64 {
    if rms <= 0.0 {
        DB_FLOOR
    } else {
        (20.0 * rms.log10()).max(DB_FLOOR)
    }
}

/// Nearest-rank percentile over an unsorted slice.
fn percentile(values: &[f64], p: f64) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx]
}

/// Estimate the silence threshold (dBFS) for a waveform.
///
/// Returns `max(noise_floor, reference + preset_offset)` where the noise
/// floor is the 5th percentile of 20 ms frame levels and the reference is
/// the waveform's overall dBFS. `config.custom_threshold_db` is used
/// verbatim when set. Always finite; never fails.
pub fn estimate_threshold_db(waveform: &Waveform, config: &SilenceConfig) -> f64 {
    if let Some(custom) = config.custom_threshold_db {
        debug!("Using custom silence threshold: {:.1} dBFS", custom);
        return custom;
    }

    let reference_db = rms_to_dbfs(calculate_rms(waveform.samples()));

    let frame_len = waveform.samples_per_ms_span(RMS_FRAME_MS).max(1);
    let frame_dbs: Vec<f64> = waveform
        .samples()
        .chunks_exact(frame_len)
        .map(|frame| rms_to_dbfs(calculate_rms(frame)))
        .collect();

    let noise_floor = if frame_dbs.is_empty() {
        DB_FLOOR
    } else {
        percentile(&frame_dbs, NOISE_FLOOR_PERCENTILE)
    };

    let threshold = noise_floor.max(reference_db + config.threshold_offset_db);

    debug!(
        "Threshold estimate: reference {:.1} dBFS, noise floor {:.1} dBFS, offset {:.1} dB -> {:.1} dBFS",
        reference_db, noise_floor, config.threshold_offset_db, threshold
    );

    threshold
}
