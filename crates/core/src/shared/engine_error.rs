use std::path::PathBuf;

use thiserror::Error;

/// Which input of a two-image comparison came back without faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageSide {
    First,
    Second,
    Both,
}

impl std::fmt::Display for ImageSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSide::First => write!(f, "first image"),
            ImageSide::Second => write!(f, "second image"),
            ImageSide::Both => write!(f, "both images"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("failed to access identity store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("identity store at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to serialize identity store: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
    #[error("embedding has zero norm")]
    DegenerateVector,
    #[error("invalid embedding: {0}")]
    InvalidEmbedding(String),
    #[error("invalid detection: {0}")]
    InvalidDetection(String),
    #[error("no face detected")]
    NoFaceDetected,
    #[error("multiple faces detected ({faces}); use an image with only one face")]
    AmbiguousEnrollment { faces: usize },
    #[error("no faces detected in {side}")]
    NoFaceInImage { side: ImageSide },
    #[error("identity label must not be empty")]
    EmptyLabel,
    #[error("batch of {size} faces exceeds the limit of {limit}")]
    OversizedBatch { size: usize, limit: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("perception failed: {0}")]
    Perception(String),
    #[error("cancelled")]
    Cancelled,
    #[error("background job failed: {0}")]
    Background(String),
}
