//! Silence-based segmentation of a waveform into candidate intervals.
//!
//! A candidate interval is a sound region bounded by silences of at least
//! the configured minimum length. Boundaries are padded outward, close
//! intervals are merged, over-long intervals are split at their quietest
//! point, and too-short intervals are dropped.

use tracing::{debug, info};

use crate::audio::threshold::{calculate_rms, rms_to_dbfs};
use crate::audio::{CandidateInterval, Waveform};
use crate::config::SilenceConfig;
use crate::error::{AvchunkError, Result};

/// Scan granularity for silence classification.
const SCAN_FRAME_MS: u64 = 10;

/// Split a waveform into candidate sound intervals.
///
/// An all-silent waveform yields an empty list; that is a legitimate
/// outcome, not an error. Output intervals are sorted ascending,
/// pairwise non-overlapping, and each at most `max_chunk_len_ms` long
/// (within one scan-frame of tolerance).
pub fn segment(
    waveform: &Waveform,
    threshold_db: f64,
    config: &SilenceConfig,
) -> Result<Vec<CandidateInterval>> {
    config.validate()?;

    let frame_samples = waveform.samples_per_ms_span(SCAN_FRAME_MS);
    if frame_samples == 0 {
        return Err(AvchunkError::Contract(format!(
            "sample rate {} Hz is too low for {} ms scan frames",
            waveform.sample_rate(),
            SCAN_FRAME_MS
        )));
    }

    let frame_dbs: Vec<f64> = waveform
        .samples()
        .chunks_exact(frame_samples)
        .map(|frame| rms_to_dbfs(calculate_rms(frame)))
        .collect();

    let total_ms = waveform.duration_ms();
    let silence_runs = find_silence_runs(
        &frame_dbs,
        threshold_db,
        config.effective_min_silence_len_ms(),
    );

    debug!(
        "Scanned {} frames at {:.1} dBFS threshold, {} silence cuts",
        frame_dbs.len(),
        threshold_db,
        silence_runs.len()
    );

    let sounds = complement_intervals(&silence_runs, total_ms);
    let padded = pad_intervals(&sounds, config.keep_silence_ms, total_ms);
    let merged = merge_intervals(&padded, config.merge_gap_ms);

    let mut split = Vec::new();
    for &(start, end) in &merged {
        if end - start <= config.max_chunk_len_ms {
            split.push((start, end));
        } else {
            split_long_interval(start, end, &frame_dbs, config.max_chunk_len_ms, &mut split);
        }
    }

    let intervals: Vec<CandidateInterval> = split
        .into_iter()
        .filter(|(start, end)| end - start >= config.min_chunk_len_ms)
        .map(|(start, end)| CandidateInterval {
            start_ms: start,
            end_ms: end,
        })
        .collect();

    info!(
        "Segmented {:.1}s of audio into {} candidate intervals",
        total_ms as f64 / 1000.0,
        intervals.len()
    );

    Ok(intervals)
}

/// Runs of sub-threshold frames lasting at least `min_silence_len_ms`,
/// as millisecond intervals. Shorter silences are treated as speech.
fn find_silence_runs(frame_dbs: &[f64], threshold_db: f64, min_silence_len_ms: u64) -> Vec<(u64, u64)> {
    let min_silence_frames = min_silence_len_ms.div_ceil(SCAN_FRAME_MS) as usize;

    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, &db) in frame_dbs.iter().enumerate() {
        let silent = db < threshold_db;
        match (silent, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start >= min_silence_frames {
                    runs.push((start as u64 * SCAN_FRAME_MS, i as u64 * SCAN_FRAME_MS));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        if frame_dbs.len() - start >= min_silence_frames {
            runs.push((
                start as u64 * SCAN_FRAME_MS,
                frame_dbs.len() as u64 * SCAN_FRAME_MS,
            ));
        }
    }

    runs
}

/// Sound intervals: everything in `[0, total_ms)` not covered by a
/// silence run.
fn complement_intervals(silence_runs: &[(u64, u64)], total_ms: u64) -> Vec<(u64, u64)> {
    let mut sounds = Vec::new();
    let mut cursor = 0u64;

    for &(start, end) in silence_runs {
        if start > cursor {
            sounds.push((cursor, start));
        }
        cursor = end;
    }

    if cursor < total_ms {
        sounds.push((cursor, total_ms));
    }

    sounds
}

/// Pad interval boundaries outward by `keep_silence_ms`, clamped to the
/// waveform bounds.
fn pad_intervals(intervals: &[(u64, u64)], keep_silence_ms: u64, total_ms: u64) -> Vec<(u64, u64)> {
    intervals
        .iter()
        .map(|&(start, end)| {
            (
                start.saturating_sub(keep_silence_ms),
                (end + keep_silence_ms).min(total_ms),
            )
        })
        .collect()
}

/// Merge adjacent intervals separated by a gap smaller than
/// `merge_gap_ms` (padding can even make them overlap).
fn merge_intervals(intervals: &[(u64, u64)], merge_gap_ms: u64) -> Vec<(u64, u64)> {
    let mut merged: Vec<(u64, u64)> = Vec::new();

    for &(start, end) in intervals {
        if let Some((_, last_end)) = merged.last_mut() {
            if start.saturating_sub(*last_end) < merge_gap_ms {
                if end > *last_end {
                    *last_end = end;
                }
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}

/// Split an over-long interval into pieces each at most `max_len_ms`.
///
/// Each cut lands on the quietest scan frame within
/// `[cursor + max/2, cursor + max]`, so no piece can be shorter than
/// half the maximum. If that window holds no frames (interval extends
/// past the last full frame), hard-split at the capped midpoint.
fn split_long_interval(
    start: u64,
    end: u64,
    frame_dbs: &[f64],
    max_len_ms: u64,
    out: &mut Vec<(u64, u64)>,
) {
    let mut cursor = start;

    while end - cursor > max_len_ms {
        let lo_frame = ((cursor + max_len_ms / 2) / SCAN_FRAME_MS) as usize;
        let hi_frame = (((cursor + max_len_ms) / SCAN_FRAME_MS) as usize).min(frame_dbs.len());

        let cut = if lo_frame < hi_frame {
            let (offset, _) = frame_dbs[lo_frame..hi_frame]
                .iter()
                .enumerate()
                .fold((0usize, f64::INFINITY), |best, (i, &db)| {
                    if db < best.1 {
                        (i, db)
                    } else {
                        best
                    }
                });
            (lo_frame + offset) as u64 * SCAN_FRAME_MS
        } else {
            cursor + ((end - cursor) / 2).min(max_len_ms)
        };

        // Guarantee forward progress
        let cut = cut.max(cursor + SCAN_FRAME_MS);
        out.push((cursor, cut));
        cursor = cut;
    }

    out.push((cursor, end));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SilencePreset;

    const SAMPLE_RATE: u32 = 16000;
    const TEST_THRESHOLD_DB: f64 = -50.0;

    /// Build a waveform from (duration_ms, loud) spans.
    fn build_waveform(spans: &[(u64, bool)]) -> Waveform {
        let mut samples = Vec::new();
        for &(ms, loud) in spans {
            let n = (SAMPLE_RATE as u64 * ms / 1000) as usize;
            if loud {
                samples.extend((0..n).map(|i| if i % 2 == 0 { 12000i16 } else { -12000 }));
            } else {
                samples.extend(std::iter::repeat(0i16).take(n));
            }
        }
        Waveform::new(samples, SAMPLE_RATE).unwrap()
    }

    #[test]
    fn test_all_silent_yields_empty() {
        let waveform = build_waveform(&[(30_000, false)]);
        let intervals = segment(&waveform, TEST_THRESHOLD_DB, &SilenceConfig::default()).unwrap();
        assert!(intervals.is_empty());
    }

    #[test]
    fn test_basic_two_interval_split() {
        // 1s loud, 1s silence (>= 700ms balanced cut), 1s loud
        let waveform = build_waveform(&[(1000, true), (1000, false), (1000, true)]);
        let intervals = segment(&waveform, TEST_THRESHOLD_DB, &SilenceConfig::default()).unwrap();

        assert_eq!(intervals.len(), 2);
        // keep_silence padding of 150ms on each side
        assert_eq!(intervals[0].start_ms, 0);
        assert_eq!(intervals[0].end_ms, 1150);
        assert_eq!(intervals[1].start_ms, 1850);
        assert_eq!(intervals[1].end_ms, 3000);
    }

    #[test]
    fn test_short_silence_not_a_cut() {
        // 400ms silence < balanced 700ms minimum: treated as speech
        let waveform = build_waveform(&[(1000, true), (400, false), (1000, true)]);
        let intervals = segment(&waveform, TEST_THRESHOLD_DB, &SilenceConfig::default()).unwrap();
        assert_eq!(intervals.len(), 1);
    }

    #[test]
    fn test_custom_min_silence_override() {
        let waveform = build_waveform(&[(1000, true), (400, false), (1000, true)]);
        let mut config = SilenceConfig::default();
        config.custom_min_silence_len_ms = Some(300);
        config.merge_gap_ms = 50;
        let intervals = segment(&waveform, TEST_THRESHOLD_DB, &config).unwrap();
        assert_eq!(intervals.len(), 2);
    }

    #[test]
    fn test_merge_pass_joins_close_intervals() {
        // 550ms silence cuts (custom min 500), but after 150ms padding the
        // remaining gap of 250ms is below the 500ms merge threshold.
        let waveform = build_waveform(&[(1000, true), (550, false), (1450, true)]);
        let mut config = SilenceConfig::default();
        config.custom_min_silence_len_ms = Some(500);
        let intervals = segment(&waveform, TEST_THRESHOLD_DB, &config).unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start_ms, 0);
        assert_eq!(intervals[0].end_ms, 3000);
    }

    #[test]
    fn test_sorted_and_non_overlapping() {
        let waveform = build_waveform(&[
            (2000, true),
            (800, false),
            (3000, true),
            (900, false),
            (1500, true),
        ]);
        let intervals = segment(&waveform, TEST_THRESHOLD_DB, &SilenceConfig::default()).unwrap();

        assert!(!intervals.is_empty());
        for pair in intervals.windows(2) {
            assert!(pair[0].end_ms <= pair[1].start_ms);
            assert!(pair[0].start_ms < pair[1].start_ms);
        }
    }

    #[test]
    fn test_max_length_enforced() {
        let waveform = build_waveform(&[(45_000, true)]);
        let config = SilenceConfig::default();
        let intervals = segment(&waveform, TEST_THRESHOLD_DB, &config).unwrap();

        assert!(intervals.len() >= 2);
        for interval in &intervals {
            assert!(interval.duration_ms() <= config.max_chunk_len_ms + SCAN_FRAME_MS);
        }
    }

    #[test]
    fn test_split_prefers_quiet_point() {
        // 25s of sound with a brief 200ms dip at 18s. The dip is too short
        // to be a silence cut, but it is the quietest point in the split
        // window [10s, 20s], so the over-long interval should split at it.
        let waveform = build_waveform(&[(18_000, true), (200, false), (6_800, true)]);
        let config = SilenceConfig::default();
        let intervals = segment(&waveform, TEST_THRESHOLD_DB, &config).unwrap();

        assert_eq!(intervals.len(), 2);
        let cut = intervals[0].end_ms;
        assert!(
            (18_000..=18_200).contains(&cut),
            "expected cut near the quiet dip, got {}",
            cut
        );
    }

    #[test]
    fn test_min_duration_filter() {
        // 500ms of sound is below the 1000ms minimum chunk length even
        // after padding on one side only... use a config without padding
        // to make the case unambiguous.
        let mut config = SilenceConfig::default();
        config.keep_silence_ms = 0;
        config.custom_min_silence_len_ms = Some(500);
        config.merge_gap_ms = 100;
        let waveform = build_waveform(&[(500, true), (900, false), (2000, true)]);
        let intervals = segment(&waveform, TEST_THRESHOLD_DB, &config).unwrap();

        assert_eq!(intervals.len(), 1);
        assert!(intervals[0].start_ms >= 1400);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let waveform = build_waveform(&[(2000, true)]);
        let mut config = SilenceConfig::default();
        config.max_chunk_len_ms = 10;
        assert!(segment(&waveform, TEST_THRESHOLD_DB, &config).is_err());
    }

    #[test]
    fn test_complement_intervals() {
        let silences = vec![(1000, 2000), (3000, 4000)];
        let sounds = complement_intervals(&silences, 5000);
        assert_eq!(sounds, vec![(0, 1000), (2000, 3000), (4000, 5000)]);
    }

    #[test]
    fn test_complement_leading_silence() {
        let silences = vec![(0, 1500)];
        let sounds = complement_intervals(&silences, 3000);
        assert_eq!(sounds, vec![(1500, 3000)]);
    }

    #[test]
    fn test_merge_intervals_overlap_from_padding() {
        let intervals = vec![(0, 1200), (1100, 2000)];
        let merged = merge_intervals(&intervals, 500);
        assert_eq!(merged, vec![(0, 2000)]);
    }

    #[test]
    fn test_split_long_interval_fallback() {
        // No frames available past the window start: midpoint fallback
        let frame_dbs: Vec<f64> = vec![];
        let mut out = Vec::new();
        split_long_interval(0, 2500, &frame_dbs, 1000, &mut out);
        assert!(out.iter().all(|(s, e)| e - s <= 1000));
        assert_eq!(out.first().unwrap().0, 0);
        assert_eq!(out.last().unwrap().1, 2500);
    }

    #[test]
    fn test_presets_affect_cut_count() {
        // A 1000ms pause cuts under very_sensitive (400ms minimum) but
        // not under very_conservative (1200ms minimum).
        let waveform = build_waveform(&[(1500, true), (1000, false), (1500, true)]);

        let sensitive = SilenceConfig::from_preset(SilencePreset::VerySensitive);
        let conservative = SilenceConfig::from_preset(SilencePreset::VeryConservative);

        let cuts_sensitive = segment(&waveform, TEST_THRESHOLD_DB, &sensitive).unwrap();
        let cuts_conservative = segment(&waveform, TEST_THRESHOLD_DB, &conservative).unwrap();

        assert_eq!(cuts_sensitive.len(), 2);
        assert_eq!(cuts_conservative.len(), 1);
    }
}
