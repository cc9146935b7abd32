//! Error types for ferrite-digits.
//!
//! Each stage of the pipeline has its own failure, collected into
//! [`PipelineError`]. The pipeline never hands these to its caller directly:
//! they are flattened into an [`ErrorKind`] plus message at the boundary.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to turn a data-URI string into a grayscale pixel grid.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("image data has no ',' after the media-type prefix")]
    MissingSeparator,

    #[error("image payload is empty")]
    EmptyPayload,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unreadable image bytes: {0}")]
    Image(#[from] image::ImageError),
}

/// Any failure between receiving an encoded image and producing a digit.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("tensor does not match engine input: {0}")]
    ShapeOrType(String),

    #[error("inference engine is disabled: {0}")]
    EngineDisabled(String),

    #[error("malformed probability vector: {0}")]
    MalformedVector(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Decode(_) => ErrorKind::Decode,
            PipelineError::ShapeOrType(_) => ErrorKind::ShapeOrType,
            PipelineError::EngineDisabled(_) => ErrorKind::EngineDisabled,
            PipelineError::MalformedVector(_) => ErrorKind::MalformedVector,
        }
    }
}

/// Error category carried by a failed classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Decode,
    ShapeOrType,
    EngineDisabled,
    MalformedVector,
    /// A stage panicked; the panic was contained.
    Internal,
}

/// Failure to load or compile a model artifact.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid lite artifact: {0}")]
    LiteFormat(String),

    #[error("unexpected model shape: {0}")]
    Shape(String),
}

impl ModelError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        ModelError::Io { path: path.to_path_buf(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Failure to load configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
