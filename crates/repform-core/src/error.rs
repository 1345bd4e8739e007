//! Error types for the repform analysis pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid pose: {0}")]
    InvalidPose(String),

    #[error("Insufficient data: need {required} frames, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Capture failure: {0}")]
    CaptureFailure(String),

    #[error("Pose model initialization failed: {0}")]
    ModelInit(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Stable tag used in structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidPose(_) => "invalid_pose",
            Error::InsufficientData { .. } => "insufficient_data",
            Error::CaptureFailure(_) => "capture_failure",
            Error::ModelInit(_) => "model_init_failure",
            Error::Config(_) => "configuration",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io",
            Error::InvalidInput(_) => "validation",
        }
    }

    /// Session-level errors abort an analysis; per-frame ones never do.
    pub fn is_per_frame(&self) -> bool {
        matches!(self, Error::InvalidPose(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
