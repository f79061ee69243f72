use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvchunkError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An upstream collaborator handed us malformed data (empty waveform,
    /// non-monotonic face timeline). Fail fast; this is a bug, not a
    /// data-quality condition.
    #[error("Contract violation: {0}")]
    Contract(String),

    #[error("Audio decode failed: {0}")]
    AudioDecode(#[from] hound::Error),

    #[error("Face timeline parse failed: {0}")]
    FaceTimeline(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AvchunkError>;
