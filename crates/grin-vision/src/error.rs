use std::path::PathBuf;

use thiserror::Error;

/// The uploaded bytes could not be decoded as an image.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InvalidImageError(#[from] pub image::ImageError);

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Could not prepare model input: {0}")]
    Input(String),

    #[error("Inference execution failed: {0}")]
    Execution(String),

    #[error("Model produced no output")]
    MissingOutput,

    #[error("Model produced a non-finite probability: {0}")]
    NonFiniteProbability(f32),
}

/// Startup-time failure to load the model artifact.
#[derive(Debug, Error)]
#[error("Failed to load model from {}: {message}", path.display())]
pub struct ModelLoadError {
    pub path: PathBuf,
    pub message: String,
}
