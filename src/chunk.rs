//! Chunk assembly: turning accepted face runs into output records with
//! stable identity and provenance. Quality decisions all happen in the
//! refiner; this stage only records them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::face::FaceRun;

/// Final output unit: one accepted audio-visual chunk.
///
/// Immutable once created. Downstream slices the source media by
/// `[start_ms, end_ms)` and applies its own lip-sync filtering and
/// transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Identifier of the source video this chunk came from.
    pub source_id: String,
    /// Index of the candidate interval this chunk was refined out of.
    pub candidate_index: usize,
    /// 0-based position among chunks from the same candidate interval.
    pub split_index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub duration_sec: f64,
    pub face_percentage: f64,
}

/// Per-video manifest consumed by the downstream slicing and filtering
/// steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkManifest {
    pub source_id: String,
    pub sample_rate: u32,
    pub chunks: Vec<ChunkRecord>,
}

impl ChunkManifest {
    pub fn total_kept_duration_sec(&self) -> f64 {
        self.chunks.iter().map(|c| c.duration_sec).sum()
    }
}

/// Stamp accepted runs from one candidate interval with provenance.
///
/// Runs arrive in ascending start order from the refiner's forward scan;
/// `split_index` is their position in that order. No filtering happens
/// here.
pub fn assemble(source_id: &str, candidate_index: usize, runs: &[FaceRun]) -> Vec<ChunkRecord> {
    debug_assert!(runs
        .windows(2)
        .all(|pair| pair[0].start_sec <= pair[1].start_sec));

    let records: Vec<ChunkRecord> = runs
        .iter()
        .enumerate()
        .map(|(split_index, run)| ChunkRecord {
            source_id: source_id.to_string(),
            candidate_index,
            split_index,
            start_ms: (run.start_sec * 1000.0).round() as u64,
            end_ms: (run.end_sec * 1000.0).round() as u64,
            duration_sec: run.duration_sec(),
            face_percentage: run.face_percentage(),
        })
        .collect();

    if !records.is_empty() {
        debug!(
            "Assembled {} chunks from candidate {}",
            records.len(),
            candidate_index
        );
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(start: f64, end: f64, total: usize, faces: usize) -> FaceRun {
        FaceRun {
            start_sec: start,
            end_sec: end,
            total_samples: total,
            face_samples: faces,
        }
    }

    #[test]
    fn test_assemble_empty() {
        assert!(assemble("vid", 0, &[]).is_empty());
    }

    #[test]
    fn test_assemble_stamps_provenance() {
        let runs = vec![run(1.0, 3.5, 100, 98), run(5.0, 7.0, 80, 80)];
        let records = assemble("aRHpoSebPPI", 3, &runs);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_id, "aRHpoSebPPI");
        assert_eq!(records[0].candidate_index, 3);
        assert_eq!(records[0].split_index, 0);
        assert_eq!(records[1].split_index, 1);

        assert_eq!(records[0].start_ms, 1000);
        assert_eq!(records[0].end_ms, 3500);
        assert_eq!(records[0].duration_sec, 2.5);
        assert_eq!(records[0].face_percentage, 0.98);
    }

    #[test]
    fn test_assemble_rounds_to_nearest_ms() {
        let records = assemble("vid", 0, &[run(0.0304, 2.9996, 10, 10)]);
        assert_eq!(records[0].start_ms, 30);
        assert_eq!(records[0].end_ms, 3000);
    }

    #[test]
    fn test_manifest_kept_duration() {
        let manifest = ChunkManifest {
            source_id: "vid".to_string(),
            sample_rate: 16000,
            chunks: assemble("vid", 0, &[run(0.0, 2.0, 10, 10), run(3.0, 4.5, 10, 10)]),
        };
        assert_eq!(manifest.total_kept_duration_sec(), 3.5);
    }

    #[test]
    fn test_manifest_json_round_trip() {
        let manifest = ChunkManifest {
            source_id: "vid".to_string(),
            sample_rate: 16000,
            chunks: assemble("vid", 1, &[run(0.5, 2.5, 50, 49)]),
        };
        let json = serde_json::to_string(&manifest).unwrap();
        let back: ChunkManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
