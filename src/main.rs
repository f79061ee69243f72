use anyhow::{Context, Result};
use avchunk::audio::Waveform;
use avchunk::config::{Config, QualityProfile, SilenceConfig, SilencePreset};
use avchunk::face;
use avchunk::pipeline::{print_summary, process_video, PipelineConfig};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "avchunk")]
#[command(version, about = "Audio-visual chunk segmentation for speech dataset building")]
#[command(
    long_about = "Split a video's extracted audio into speech chunks by silence detection, \
then trim and split each chunk so it contains a single continuous face-visible speech \
segment. Consumes a mono WAV and a face-detection timeline; emits a chunk manifest for \
the downstream slicing, lip-sync filtering, and transcription steps."
)]
struct Cli {
    /// Extracted mono WAV audio for the source video
    audio: PathBuf,

    /// Face-detection timeline JSON ([{"t": 0.0, "face": true}, ...])
    #[arg(long)]
    faces: PathBuf,

    /// Source video identifier (defaults to the audio file stem)
    #[arg(long)]
    source_id: Option<String>,

    /// Output manifest path (defaults to <audio stem>.chunks.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Silence sensitivity preset: very_sensitive, sensitive, balanced,
    /// conservative, very_conservative
    #[arg(long)]
    silence_preset: Option<String>,

    /// Silence threshold override in dBFS (bypasses estimation)
    #[arg(long)]
    custom_silence_thresh: Option<f64>,

    /// Minimum silence length override in ms
    #[arg(long)]
    custom_min_silence: Option<u64>,

    /// Quality profile: benchmarking, training
    #[arg(long)]
    profile: Option<String>,

    /// Blink/turn tolerance for face continuity, in seconds
    #[arg(long)]
    max_face_gap: Option<f64>,

    /// Face-presence sampling cadence, in seconds
    #[arg(long)]
    refine_sample_rate: Option<f64>,

    /// Minimum face-presence fraction for accepted chunks (0..1)
    #[arg(long)]
    min_face_percentage: Option<f64>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn derive_output_path(audio: &Path) -> PathBuf {
    let stem = audio.file_stem().unwrap_or_default();
    let mut output = audio.to_path_buf();
    output.set_file_name(format!("{}.chunks.json", stem.to_string_lossy()));
    output
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if !cli.audio.exists() {
        anyhow::bail!("Audio file not found: {}", cli.audio.display());
    }
    if !cli.faces.exists() {
        anyhow::bail!("Face timeline file not found: {}", cli.faces.display());
    }

    let config = Config::load().context("Failed to load configuration")?;

    let preset = cli
        .silence_preset
        .as_deref()
        .map(SilencePreset::parse_lenient)
        .unwrap_or(config.default_preset);

    let profile = match cli.profile.as_deref() {
        Some(s) => s
            .parse::<QualityProfile>()
            .map_err(|e| anyhow::anyhow!(e))?,
        None => config.default_profile,
    };

    let mut silence = SilenceConfig::from_preset(preset);
    silence.custom_threshold_db = cli.custom_silence_thresh;
    silence.custom_min_silence_len_ms = cli.custom_min_silence;

    let mut refine = profile.refine_config();
    if let Some(gap) = cli.max_face_gap {
        refine.max_face_gap_sec = gap;
    }
    if let Some(rate) = cli.refine_sample_rate {
        refine.sample_interval_sec = rate;
    }
    if let Some(pct) = cli.min_face_percentage {
        refine.min_face_percentage = pct;
    }

    let source_id = cli.source_id.unwrap_or_else(|| {
        cli.audio
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    });
    let output = cli.output.unwrap_or_else(|| derive_output_path(&cli.audio));

    info!("Audio:    {}", cli.audio.display());
    info!("Faces:    {}", cli.faces.display());
    info!("Output:   {}", output.display());
    info!("Preset:   {}", preset);
    info!("Profile:  {}", profile);

    let waveform = Waveform::from_wav_file(&cli.audio)
        .with_context(|| format!("Failed to load audio from {}", cli.audio.display()))?;
    let observations = face::load_observations(&cli.faces)
        .with_context(|| format!("Failed to load face timeline from {}", cli.faces.display()))?;

    let pipeline_config = PipelineConfig {
        silence,
        refine,
        show_progress: !cli.no_progress,
    };

    let result = process_video(&source_id, &waveform, &observations, &pipeline_config)
        .context("Segmentation failed")?;

    let manifest_json =
        serde_json::to_string_pretty(&result.manifest).context("Failed to serialize manifest")?;
    std::fs::write(&output, manifest_json)
        .with_context(|| format!("Failed to write manifest to {}", output.display()))?;

    print_summary(&result);

    Ok(())
}
