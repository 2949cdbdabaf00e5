//! Upload orchestration: store, validate, preprocess, classify, persist.
//!
//! Each upload moves through [`UploadStage`]s in order on a single task. A
//! failure at any step ends the upload with an [`UploadFailure`] that records
//! which stage was being attempted and the structured cause.

use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use thiserror::Error;
use tracing::{error, info, warn};

use grin_db::Database;
use grin_types::ClassificationRecord;
use grin_vision::{Classifier, InferenceError, InvalidImageError};

use crate::storage::{ImageStore, StoredImage};

/// Shown for every failure except an undecodable upload.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred: the image could not be processed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    Stored,
    Validated,
    Preprocessed,
    Classified,
    Persisted,
    Succeeded,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Stored => "stored",
            Self::Validated => "validated",
            Self::Preprocessed => "preprocessed",
            Self::Classified => "classified",
            Self::Persisted => "persisted",
            Self::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorKind {
    Storage,
    InvalidImage,
    Inference,
    Persistence,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to store upload: {0:#}")]
    Storage(anyhow::Error),

    #[error("Uploaded file is not a valid image: {0}")]
    InvalidImage(#[source] InvalidImageError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Failed to persist classification: {0:#}")]
    Persistence(anyhow::Error),
}

impl UploadError {
    pub fn kind(&self) -> UploadErrorKind {
        match self {
            Self::Storage(_) => UploadErrorKind::Storage,
            Self::InvalidImage(_) => UploadErrorKind::InvalidImage,
            Self::Inference(_) => UploadErrorKind::Inference,
            Self::Persistence(_) => UploadErrorKind::Persistence,
        }
    }

    /// Message for the classify page. Only an undecodable upload is described.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidImage(_) => self.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// A failed upload: the stage it was trying to reach and why it could not.
#[derive(Debug, Error)]
#[error("upload failed before reaching {failed_at}: {error}")]
pub struct UploadFailure {
    pub failed_at: UploadStage,
    #[source]
    pub error: UploadError,
}

impl UploadFailure {
    pub fn kind(&self) -> UploadErrorKind {
        self.error.kind()
    }

    pub fn user_message(&self) -> String {
        self.error.user_message()
    }
}

/// What happens to an already stored file when a later step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Leave the file in place.
    #[default]
    Keep,
    /// Delete it as a compensating action.
    DeleteOnFailure,
}

pub struct Uploader {
    store: Arc<ImageStore>,
    classifier: Classifier,
    db: Arc<Database>,
    cleanup: CleanupPolicy,
}

impl Uploader {
    pub fn new(
        store: Arc<ImageStore>,
        classifier: Classifier,
        db: Arc<Database>,
        cleanup: CleanupPolicy,
    ) -> Self {
        Self { store, classifier, db, cleanup }
    }

    /// Run one upload to completion.
    ///
    /// `original_name` is the client-supplied file name; only its extension
    /// is used.
    pub async fn process(
        &self,
        original_name: Option<&str>,
        bytes: Bytes,
    ) -> Result<ClassificationRecord, UploadFailure> {
        // Received -> Stored
        let stored = self
            .store
            .store(original_name, &bytes)
            .await
            .map_err(|e| fail(UploadStage::Stored, UploadError::Storage(e)))?;

        match self.after_store(&stored, bytes).await {
            Ok(record) => {
                info!(
                    id = record.id,
                    path = %record.image_path,
                    label = %record.label,
                    "Upload classified"
                );
                Ok(record)
            }
            Err(failure) => {
                if self.cleanup == CleanupPolicy::DeleteOnFailure {
                    if let Err(e) = self.store.delete(&stored).await {
                        warn!("Failed to clean up {}: {:#}", stored.relative_path, e);
                    }
                }
                Err(failure)
            }
        }
    }

    async fn after_store(
        &self,
        stored: &StoredImage,
        bytes: Bytes,
    ) -> Result<ClassificationRecord, UploadFailure> {
        // Stored -> Validated
        let to_validate = bytes.clone();
        tokio::task::spawn_blocking(move || grin_vision::validate(&to_validate))
            .await
            .map_err(|e| {
                fail(
                    UploadStage::Validated,
                    InferenceError::Input(format!("decoder task failed: {e}")).into(),
                )
            })?
            .map_err(|e| fail(UploadStage::Validated, UploadError::InvalidImage(e)))?;

        // Validated -> Preprocessed -> Classified
        let classifier = self.classifier.clone();
        let label = tokio::task::spawn_blocking(move || {
            let tensor = grin_vision::preprocess(&bytes)
                .map_err(|e| (UploadStage::Preprocessed, InferenceError::Input(e.to_string())))?;
            classifier
                .classify(&tensor)
                .map_err(|e| (UploadStage::Classified, e))
        })
        .await
        .map_err(|e| {
            fail(
                UploadStage::Classified,
                InferenceError::Execution(format!("inference task failed: {e}")).into(),
            )
        })?
        .map_err(|(stage, e)| fail(stage, e.into()))?;

        // Classified -> Persisted
        let db = self.db.clone();
        let path = stored.relative_path.clone();
        tokio::task::spawn_blocking(move || db.create_record(&path, label))
            .await
            .map_err(|e| {
                fail(
                    UploadStage::Persisted,
                    UploadError::Persistence(anyhow::anyhow!("spawn_blocking join error: {}", e)),
                )
            })?
            .map_err(|e| fail(UploadStage::Persisted, UploadError::Persistence(e)))
    }
}

fn fail(failed_at: UploadStage, error: UploadError) -> UploadFailure {
    let failure = UploadFailure { failed_at, error };
    match failure.kind() {
        UploadErrorKind::InvalidImage => {
            warn!(stage = %failed_at, "Rejected upload: {}", failure.error)
        }
        _ => {
            error!(stage = %failed_at, kind = ?failure.kind(), "Upload failed: {}", failure.error)
        }
    }
    failure
}
