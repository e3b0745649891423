//! Sending staged images to the external image host.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::staging::{StagedImage, StagedImages};

#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("image host request failed: {0}")]
    Transport(String),
    #[error("image host responded with status {status}")]
    Status { status: u16 },
    #[error("image host rejected the upload: {0}")]
    Rejected(String),
    #[error("image host response could not be decoded: {0}")]
    Decode(String),
}

/// A single-file image hosting endpoint.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload one file and return its public URL.
    async fn upload(&self, image: &StagedImage) -> Result<String, ImageHostError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Hosted { filename: String, url: String },
    Failed { filename: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub filename: String,
    pub reason: String,
}

/// Per-file results of one upload batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn hosted_urls(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                UploadOutcome::Hosted { url, .. } => Some(url.clone()),
                UploadOutcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<UploadFailure> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                UploadOutcome::Failed { filename, reason } => Some(UploadFailure {
                    filename: filename.clone(),
                    reason: reason.clone(),
                }),
                UploadOutcome::Hosted { .. } => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| matches!(outcome, UploadOutcome::Failed { .. }))
    }
}

/// What to do with a save when some of its images could not be hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialUploadPolicy {
    /// Save with the images that were hosted and report the rest.
    #[default]
    Proceed,
    /// Abort the save if any image failed.
    Reject,
}

#[derive(Clone)]
pub struct ImageUploader {
    host: Arc<dyn ImageHost>,
    policy: PartialUploadPolicy,
}

impl ImageUploader {
    pub fn new(host: Arc<dyn ImageHost>, policy: PartialUploadPolicy) -> Self {
        Self { host, policy }
    }

    pub fn policy(&self) -> PartialUploadPolicy {
        self.policy
    }

    /// Upload every staged file independently; one failure never stops the rest.
    pub async fn upload_all(&self, staged: &StagedImages) -> UploadReport {
        let mut outcomes = Vec::with_capacity(staged.len());

        for image in staged.iter() {
            counter!("noticeboard_image_upload_total").increment(1);
            let started = Instant::now();
            let result = self.host.upload(image).await;
            histogram!("noticeboard_image_upload_ms")
                .record(started.elapsed().as_secs_f64() * 1000.0);
            match result {
                Ok(url) => {
                    info!(
                        target = "noticeboard::images",
                        filename = %image.filename,
                        url = %url,
                        "image hosted"
                    );
                    outcomes.push(UploadOutcome::Hosted {
                        filename: image.filename.clone(),
                        url,
                    });
                }
                Err(err) => {
                    counter!("noticeboard_image_upload_failed_total").increment(1);
                    warn!(
                        target = "noticeboard::images",
                        filename = %image.filename,
                        error = %err,
                        "image upload failed"
                    );
                    outcomes.push(UploadOutcome::Failed {
                        filename: image.filename.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        UploadReport { outcomes }
    }
}
