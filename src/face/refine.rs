//! Face-continuity refinement of candidate intervals.
//!
//! A single forward scan over the sampled face timeline groups samples
//! into maximal runs, tolerating no-face gaps up to the configured blink
//! tolerance. Runs close at the last face-confirmed timestamp, so an
//! accepted run never ends on an uncertain no-face tail. Closed runs must
//! pass the duration and face-percentage gates to survive; everything
//! else is discarded.

use tracing::{debug, trace};

use crate::config::RefineConfig;
use crate::error::{AvchunkError, Result};
use crate::face::{FaceRun, FaceSample};

/// In-progress run state for the forward scan.
struct OpenRun {
    start_sec: f64,
    last_face_sec: f64,
    total_samples: usize,
    face_samples: usize,
    /// No-face samples seen since `last_face_sec`. Dropped from the
    /// totals when the run closes, matching the excluded time tail.
    trailing_gap_samples: usize,
}

impl OpenRun {
    fn open(sample: &FaceSample) -> Self {
        Self {
            start_sec: sample.timestamp_sec,
            last_face_sec: sample.timestamp_sec,
            total_samples: 1,
            face_samples: 1,
            trailing_gap_samples: 0,
        }
    }

    fn close(self) -> FaceRun {
        FaceRun {
            start_sec: self.start_sec,
            end_sec: self.last_face_sec,
            total_samples: self.total_samples - self.trailing_gap_samples,
            face_samples: self.face_samples,
        }
    }
}

/// Refine one candidate interval's face timeline into accepted runs.
///
/// "No face anywhere" is a legitimate zero-run outcome. Empty or
/// non-monotonic sample sequences indicate an upstream sampler bug and
/// fail fast.
pub fn refine_interval(samples: &[FaceSample], config: &RefineConfig) -> Result<Vec<FaceRun>> {
    config.validate()?;

    if samples.is_empty() {
        return Err(AvchunkError::Contract(
            "face sample sequence is empty".to_string(),
        ));
    }
    for pair in samples.windows(2) {
        if pair[1].timestamp_sec <= pair[0].timestamp_sec {
            return Err(AvchunkError::Contract(format!(
                "face sample timestamps not strictly increasing at t={:.3}",
                pair[1].timestamp_sec
            )));
        }
    }

    let mut accepted = Vec::new();
    let mut active: Option<OpenRun> = None;

    for sample in samples {
        active = match active {
            None => {
                if sample.has_face {
                    Some(OpenRun::open(sample))
                } else {
                    None
                }
            }
            Some(mut run) => {
                if sample.has_face {
                    run.total_samples += 1;
                    run.face_samples += 1;
                    run.last_face_sec = sample.timestamp_sec;
                    run.trailing_gap_samples = 0;
                    Some(run)
                } else {
                    run.total_samples += 1;
                    run.trailing_gap_samples += 1;
                    let gap = sample.timestamp_sec - run.last_face_sec;
                    if gap > config.max_face_gap_sec {
                        // The current no-face sample cannot start a new run.
                        evaluate(run.close(), config, &mut accepted);
                        None
                    } else {
                        Some(run)
                    }
                }
            }
        };
    }

    if let Some(run) = active {
        evaluate(run.close(), config, &mut accepted);
    }

    debug!(
        "Refined {} samples into {} accepted runs",
        samples.len(),
        accepted.len()
    );

    Ok(accepted)
}

/// Apply the quality gates to a closed run.
fn evaluate(run: FaceRun, config: &RefineConfig, accepted: &mut Vec<FaceRun>) {
    if run.duration_sec() < config.min_chunk_duration_sec {
        trace!(
            "Rejected run [{:.2}s, {:.2}s]: duration {:.2}s below minimum",
            run.start_sec,
            run.end_sec,
            run.duration_sec()
        );
        return;
    }
    if run.face_percentage() < config.min_face_percentage {
        trace!(
            "Rejected run [{:.2}s, {:.2}s]: face percentage {:.2} below {:.2}",
            run.start_sec,
            run.end_sec,
            run.face_percentage(),
            config.min_face_percentage
        );
        return;
    }
    accepted.push(run);
}
