use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WhitenError {
    #[error("failed to load classifier model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("failed to load image {}: {reason}", path.display())]
    ImageLoad { path: PathBuf, reason: String },

    #[error("detection failed: {0}")]
    Detection(String),

    #[error("no face or mouth detected")]
    NoFaceOrMouthDetected,

    #[error("cannot write to {}: {reason}", path.display())]
    OutputPathUnwritable { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WhitenError {
    pub(crate) fn unwritable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        WhitenError::OutputPathUnwritable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WhitenError>;
