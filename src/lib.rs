pub mod audio;
pub mod chunk;
pub mod config;
pub mod error;
pub mod face;
pub mod pipeline;

pub use chunk::{assemble, ChunkManifest, ChunkRecord};
pub use config::{Config, QualityProfile, RefineConfig, SilenceConfig, SilencePreset};
pub use error::{AvchunkError, Result};
pub use pipeline::{print_summary, process_video, PipelineConfig, PipelineResult, PipelineStats};
