use thiserror::Error;

pub type Result<T, E = FilmstripError> = std::result::Result<T, E>;

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum FilmstripError {
    #[error("invalid trace format: root value is not an object")]
    InvalidFormat,
    #[error("trace events must be an array")]
    InvalidEventList,
    #[error("no frames to export")]
    EmptyExport,
    #[error("export failed at frame {index}: {reason}")]
    ExportFailed { index: usize, reason: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
