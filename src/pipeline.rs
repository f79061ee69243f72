//! End-to-end segmentation pipeline for one source video.
//!
//! Stages: threshold estimation → silence segmentation → face-presence
//! sampling → continuity refinement → chunk assembly. Each stage is a
//! pure function over the prior stage's full output; processing one
//! video shares no state with any other run.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::audio::{estimate_threshold_db, segment, Waveform};
use crate::chunk::{assemble, ChunkManifest};
use crate::config::{RefineConfig, SilenceConfig};
use crate::error::Result;
use crate::face::{refine_interval, sample_timeline, FaceSample};

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub silence: SilenceConfig,
    pub refine: RefineConfig,
    /// Show a progress bar while refining candidate intervals.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            silence: SilenceConfig::default(),
            refine: RefineConfig::default(),
            show_progress: true,
        }
    }
}

/// Statistics from one segmentation run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Silence threshold used (estimated or custom).
    pub threshold_db: f64,
    /// Candidate intervals out of silence segmentation.
    pub candidate_intervals: usize,
    /// Chunks that survived face-continuity refinement.
    pub accepted_chunks: usize,
    /// Total input audio duration.
    pub audio_duration: Duration,
    /// Summed duration of candidate intervals (pre-refinement).
    pub candidate_duration_sec: f64,
    /// Summed duration of accepted chunks.
    pub kept_duration_sec: f64,
    pub segmentation_time: Duration,
    pub refinement_time: Duration,
}

/// Result of segmenting one video.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub manifest: ChunkManifest,
    pub stats: PipelineStats,
}

impl PipelineResult {
    /// True when the video produced no usable speech. A legitimate
    /// outcome, reported distinctly from a failed run.
    pub fn is_empty(&self) -> bool {
        self.manifest.chunks.is_empty()
    }
}

/// Segment one video's pre-loaded waveform and face-observation stream
/// into quality-gated chunks.
///
/// `observations` must cover the timespan of every candidate interval
/// the segmenter finds; it may be empty only if the waveform is entirely
/// silent (the refinement loop is never entered in that case).
pub fn process_video(
    source_id: &str,
    waveform: &Waveform,
    observations: &[FaceSample],
    config: &PipelineConfig,
) -> Result<PipelineResult> {
    info!(
        "Segmenting '{}': {:.1}s audio, preset '{}'",
        source_id,
        waveform.duration().as_secs_f64(),
        config.silence.preset
    );

    let segmentation_start = Instant::now();
    let threshold_db = estimate_threshold_db(waveform, &config.silence);
    let candidates = segment(waveform, threshold_db, &config.silence)?;
    let segmentation_time = segmentation_start.elapsed();

    let candidate_duration_sec: f64 = candidates.iter().map(|c| c.duration_sec()).sum();
    info!(
        "Found {} candidate intervals ({:.1}s of sound) at {:.1} dBFS",
        candidates.len(),
        candidate_duration_sec,
        threshold_db
    );

    let progress = if config.show_progress && !candidates.is_empty() {
        let pb = ProgressBar::new(candidates.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} intervals {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };

    let refinement_start = Instant::now();
    let mut chunks = Vec::new();

    for (candidate_index, candidate) in candidates.iter().enumerate() {
        let timeline = sample_timeline(
            observations,
            candidate.start_sec(),
            candidate.end_sec(),
            config.refine.sample_interval_sec,
        )?;
        let runs = refine_interval(&timeline, &config.refine)?;

        debug!(
            "Candidate {} [{:.2}s, {:.2}s): {} accepted runs",
            candidate_index,
            candidate.start_sec(),
            candidate.end_sec(),
            runs.len()
        );

        chunks.extend(assemble(source_id, candidate_index, &runs));

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let refinement_time = refinement_start.elapsed();

    let manifest = ChunkManifest {
        source_id: source_id.to_string(),
        sample_rate: waveform.sample_rate(),
        chunks,
    };

    let stats = PipelineStats {
        threshold_db,
        candidate_intervals: candidates.len(),
        accepted_chunks: manifest.chunks.len(),
        audio_duration: waveform.duration(),
        candidate_duration_sec,
        kept_duration_sec: manifest.total_kept_duration_sec(),
        segmentation_time,
        refinement_time,
    };

    if manifest.chunks.is_empty() {
        info!("No usable speech in '{}'", source_id);
    } else {
        info!(
            "Kept {} chunks, {:.1}s of {:.1}s candidate audio",
            stats.accepted_chunks, stats.kept_duration_sec, stats.candidate_duration_sec
        );
    }

    Ok(PipelineResult { manifest, stats })
}

/// Print a summary of a segmentation run.
pub fn print_summary(result: &PipelineResult) {
    let stats = &result.stats;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                     Segmentation Complete                      ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Source:      {}", result.manifest.source_id);
    println!(
        "  Audio:       {:.1}s at {} Hz",
        stats.audio_duration.as_secs_f64(),
        result.manifest.sample_rate
    );
    println!("  Threshold:   {:.1} dBFS", stats.threshold_db);
    println!();
    println!("  Candidates:  {}", stats.candidate_intervals);
    println!("  Chunks:      {}", stats.accepted_chunks);

    if stats.candidate_duration_sec > 0.0 {
        let reduction = (stats.candidate_duration_sec - stats.kept_duration_sec)
            / stats.candidate_duration_sec
            * 100.0;
        println!(
            "  Duration:    {:.1}s -> {:.1}s ({:.1}% removed by refinement)",
            stats.candidate_duration_sec, stats.kept_duration_sec, reduction
        );
    }

    println!();
    println!("  Timing:");
    println!(
        "    Segment:   {:.2}s",
        stats.segmentation_time.as_secs_f64()
    );
    println!(
        "    Refine:    {:.2}s",
        stats.refinement_time.as_secs_f64()
    );

    if result.is_empty() {
        println!();
        println!("  Note: no usable speech found (this is not an error)");
    }
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
