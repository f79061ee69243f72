//! Resampling adapter over the external face detector's output.
//!
//! The detector runs at whatever rate the orchestration layer gave it;
//! the refiner wants a uniform grid. Face presence is a boolean, so the
//! sampler nearest-neighbor-holds the last known observation; it never
//! interpolates.

use tracing::debug;

use crate::error::{AvchunkError, Result};
use crate::face::FaceSample;

/// Resample an observation stream onto a uniform grid covering
/// `[start_sec, end_sec)` at `interval_sec` spacing.
///
/// Each grid point takes the value of the latest observation at or
/// before it; grid points before the first observation hold the first
/// observation's value. Empty or non-monotonic observation streams are
/// contract violations on the upstream detector adapter.
pub fn sample_timeline(
    observations: &[FaceSample],
    start_sec: f64,
    end_sec: f64,
    interval_sec: f64,
) -> Result<Vec<FaceSample>> {
    if observations.is_empty() {
        return Err(AvchunkError::Contract(
            "face observation stream is empty".to_string(),
        ));
    }
    if !(interval_sec > 0.0) {
        return Err(AvchunkError::Config(
            "sampling interval must be positive".to_string(),
        ));
    }
    if end_sec <= start_sec {
        return Err(AvchunkError::Contract(format!(
            "empty sampling range [{:.3}, {:.3})",
            start_sec, end_sec
        )));
    }
    for pair in observations.windows(2) {
        if pair[1].timestamp_sec <= pair[0].timestamp_sec {
            return Err(AvchunkError::Contract(format!(
                "face observations not strictly increasing at t={:.3}",
                pair[1].timestamp_sec
            )));
        }
    }

    let mut timeline = Vec::new();
    let mut idx = 0usize;
    let mut t = start_sec;

    while t < end_sec {
        while idx + 1 < observations.len() && observations[idx + 1].timestamp_sec <= t {
            idx += 1;
        }
        timeline.push(FaceSample {
            timestamp_sec: t,
            has_face: observations[idx].has_face,
        });
        // Recompute from the origin so spacing stays uniform instead of
        // accumulating float error.
        t = start_sec + timeline.len() as f64 * interval_sec;
    }

    debug!(
        "Sampled {} face points over [{:.2}s, {:.2}s) at {:.0}ms",
        timeline.len(),
        start_sec,
        end_sec,
        interval_sec * 1000.0
    );

    Ok(timeline)
}
