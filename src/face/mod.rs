pub mod refine;
pub mod sampler;

pub use refine::refine_interval;
pub use sampler::sample_timeline;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One face-presence observation at a point in time.
///
/// Used both for the external detector's native output stream and for
/// the uniformly-resampled timeline the refiner consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceSample {
    #[serde(rename = "t")]
    pub timestamp_sec: f64,
    #[serde(rename = "face")]
    pub has_face: bool,
}

/// Load the detector's observation stream from a JSON file
/// (`[{"t": 0.0, "face": true}, ...]`).
pub fn load_observations(path: &Path) -> Result<Vec<FaceSample>> {
    let contents = std::fs::read_to_string(path)?;
    let observations: Vec<FaceSample> = serde_json::from_str(&contents)?;
    Ok(observations)
}

/// A maximal sub-interval with continuous (gap-tolerant) face visibility.
///
/// `end_sec` always lands on a face-confirmed sample; the trailing
/// no-face tail is never included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRun {
    pub start_sec: f64,
    pub end_sec: f64,
    pub total_samples: usize,
    pub face_samples: usize,
}

impl FaceRun {
    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// Fraction of sampled timestamps within the run where a face was
    /// detected, in [0, 1].
    pub fn face_percentage(&self) -> f64 {
        if self.total_samples == 0 {
            0.0
        } else {
            self.face_samples as f64 / self.total_samples as f64
        }
    }
}
