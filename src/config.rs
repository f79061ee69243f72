use crate::error::{AvchunkError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Named silence-detection sensitivity presets.
///
/// Each preset bundles the four silence-splitting parameters so users can
/// pick a sensitivity level instead of tuning raw numbers. More sensitive
/// presets cut on shorter, louder "silences" and produce shorter chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SilencePreset {
    VerySensitive,
    Sensitive,
    #[default]
    Balanced,
    Conservative,
    VeryConservative,
}

/// Parameter bundle resolved from a preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetParams {
    pub min_silence_len_ms: u64,
    pub threshold_offset_db: f64,
    pub max_chunk_len_ms: u64,
    pub keep_silence_ms: u64,
}

impl SilencePreset {
    /// Immutable preset table. Constructed per call from constants; there
    /// is no runtime-mutable global state behind this.
    pub const fn params(self) -> PresetParams {
        match self {
            SilencePreset::VerySensitive => PresetParams {
                min_silence_len_ms: 400,
                threshold_offset_db: -16.0,
                max_chunk_len_ms: 15_000,
                keep_silence_ms: 100,
            },
            SilencePreset::Sensitive => PresetParams {
                min_silence_len_ms: 500,
                threshold_offset_db: -18.0,
                max_chunk_len_ms: 18_000,
                keep_silence_ms: 120,
            },
            SilencePreset::Balanced => PresetParams {
                min_silence_len_ms: 700,
                threshold_offset_db: -20.0,
                max_chunk_len_ms: 20_000,
                keep_silence_ms: 150,
            },
            SilencePreset::Conservative => PresetParams {
                min_silence_len_ms: 900,
                threshold_offset_db: -22.0,
                max_chunk_len_ms: 25_000,
                keep_silence_ms: 180,
            },
            SilencePreset::VeryConservative => PresetParams {
                min_silence_len_ms: 1200,
                threshold_offset_db: -25.0,
                max_chunk_len_ms: 30_000,
                keep_silence_ms: 200,
            },
        }
    }

    pub const fn all() -> [SilencePreset; 5] {
        [
            SilencePreset::VerySensitive,
            SilencePreset::Sensitive,
            SilencePreset::Balanced,
            SilencePreset::Conservative,
            SilencePreset::VeryConservative,
        ]
    }

    /// Parse a preset name, falling back to `balanced` on unknown input.
    ///
    /// Unrecognized preset names are user input, not a hard error; the
    /// fallback is surfaced as a warning.
    pub fn parse_lenient(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "very_sensitive" => SilencePreset::VerySensitive,
            "sensitive" => SilencePreset::Sensitive,
            "balanced" => SilencePreset::Balanced,
            "conservative" => SilencePreset::Conservative,
            "very_conservative" => SilencePreset::VeryConservative,
            other => {
                warn!(
                    "Unknown silence preset '{}', falling back to 'balanced'",
                    other
                );
                SilencePreset::Balanced
            }
        }
    }
}

impl std::fmt::Display for SilencePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SilencePreset::VerySensitive => write!(f, "very_sensitive"),
            SilencePreset::Sensitive => write!(f, "sensitive"),
            SilencePreset::Balanced => write!(f, "balanced"),
            SilencePreset::Conservative => write!(f, "conservative"),
            SilencePreset::VeryConservative => write!(f, "very_conservative"),
        }
    }
}

/// Configuration for silence-based segmentation.
///
/// Defaults are resolved once from the preset table; the optional
/// `custom_*` fields override the preset-derived values when present.
#[derive(Debug, Clone)]
pub struct SilenceConfig {
    pub preset: SilencePreset,

    /// Minimum silence run length (ms) that becomes a cut point.
    pub min_silence_len_ms: u64,

    /// Offset applied to the waveform's reference dBFS level.
    pub threshold_offset_db: f64,

    /// Hard upper bound on candidate interval length (ms).
    pub max_chunk_len_ms: u64,

    /// Silence padding kept at each interval boundary (ms), so word
    /// onsets and codas are not clipped.
    pub keep_silence_ms: u64,

    /// Adjacent intervals separated by less than this are merged (ms).
    pub merge_gap_ms: u64,

    /// Intervals shorter than this are dropped (ms).
    pub min_chunk_len_ms: u64,

    /// Verbatim threshold override (dBFS); bypasses estimation entirely.
    pub custom_threshold_db: Option<f64>,

    /// Override for the preset's minimum silence length (ms).
    pub custom_min_silence_len_ms: Option<u64>,
}

impl SilenceConfig {
    pub fn from_preset(preset: SilencePreset) -> Self {
        let params = preset.params();
        Self {
            preset,
            min_silence_len_ms: params.min_silence_len_ms,
            threshold_offset_db: params.threshold_offset_db,
            max_chunk_len_ms: params.max_chunk_len_ms,
            keep_silence_ms: params.keep_silence_ms,
            merge_gap_ms: 500,
            min_chunk_len_ms: 1000,
            custom_threshold_db: None,
            custom_min_silence_len_ms: None,
        }
    }

    /// Minimum silence length actually in force for this run.
    pub fn effective_min_silence_len_ms(&self) -> u64 {
        self.custom_min_silence_len_ms
            .unwrap_or(self.min_silence_len_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_chunk_len_ms == 0 {
            return Err(AvchunkError::Config(
                "min_chunk_len_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_chunk_len_ms < self.min_chunk_len_ms {
            return Err(AvchunkError::Config(format!(
                "max_chunk_len_ms ({}) must be >= min_chunk_len_ms ({})",
                self.max_chunk_len_ms, self.min_chunk_len_ms
            )));
        }
        if self.effective_min_silence_len_ms() == 0 {
            return Err(AvchunkError::Config(
                "minimum silence length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self::from_preset(SilencePreset::default())
    }
}

/// Named parameter regime trading chunk yield against per-chunk quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityProfile {
    /// Strict face-continuity gating for evaluation-grade output.
    #[default]
    Benchmarking,
    /// Looser gating for higher-yield training data.
    Training,
}

impl QualityProfile {
    pub fn refine_config(self) -> RefineConfig {
        match self {
            QualityProfile::Benchmarking => RefineConfig::benchmarking(),
            QualityProfile::Training => RefineConfig::training(),
        }
    }
}

impl std::fmt::Display for QualityProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityProfile::Benchmarking => write!(f, "benchmarking"),
            QualityProfile::Training => write!(f, "training"),
        }
    }
}

impl std::str::FromStr for QualityProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "benchmarking" => Ok(QualityProfile::Benchmarking),
            "training" => Ok(QualityProfile::Training),
            _ => Err(format!(
                "Unknown profile: {}. Use 'benchmarking' or 'training'",
                s
            )),
        }
    }
}

/// Configuration for face-continuity refinement.
#[derive(Debug, Clone)]
pub struct RefineConfig {
    /// Cadence at which face presence is resampled (seconds). Smaller is
    /// more precise gap detection, at more detector lookups.
    pub sample_interval_sec: f64,

    /// Longest tolerated no-face gap (blink, quick head turn) before a
    /// run is closed (seconds).
    pub max_face_gap_sec: f64,

    /// Minimum fraction of face-positive samples for a run to be kept.
    pub min_face_percentage: f64,

    /// Minimum accepted run duration (seconds).
    pub min_chunk_duration_sec: f64,
}

impl RefineConfig {
    /// Strict profile for benchmarking-grade output.
    pub fn benchmarking() -> Self {
        Self {
            sample_interval_sec: 0.03,
            max_face_gap_sec: 0.2,
            min_face_percentage: 0.95,
            min_chunk_duration_sec: 1.0,
        }
    }

    /// Higher-yield profile for training data.
    pub fn training() -> Self {
        Self {
            sample_interval_sec: 0.05,
            max_face_gap_sec: 0.25,
            min_face_percentage: 0.80,
            min_chunk_duration_sec: 1.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_interval_sec > 0.0) {
            return Err(AvchunkError::Config(
                "sample_interval_sec must be positive".to_string(),
            ));
        }
        if self.max_face_gap_sec < 0.0 {
            return Err(AvchunkError::Config(
                "max_face_gap_sec must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_face_percentage) {
            return Err(AvchunkError::Config(
                "min_face_percentage must be within [0, 1]".to_string(),
            ));
        }
        if self.min_chunk_duration_sec < 0.0 {
            return Err(AvchunkError::Config(
                "min_chunk_duration_sec must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self::benchmarking()
    }
}

/// Application-level defaults, loaded from an optional config file with
/// environment-variable overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub default_preset: SilencePreset,
    pub default_profile: QualityProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_preset: SilencePreset::default(),
            default_profile: QualityProfile::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(preset) = std::env::var("AVCHUNK_PRESET") {
            config.default_preset = SilencePreset::parse_lenient(&preset);
        }
        if let Ok(profile) = std::env::var("AVCHUNK_PROFILE") {
            if let Ok(p) = profile.parse() {
                config.default_profile = p;
            }
        }

        Ok(config)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("avchunk").join("config.toml"))
    }
}
