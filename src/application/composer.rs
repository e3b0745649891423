//! Posting new announcements.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::application::images::{ImageUploader, PartialUploadPolicy, UploadFailure};
use crate::application::repos::{AnnouncementsWriteRepo, CreateAnnouncementParams, RepoError};
use crate::domain::announcements::{AnnouncementRecord, AnnouncementText, normalize_images};
use crate::domain::error::DomainError;
use crate::domain::staging::StagedImages;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{} image(s) failed to upload", .0.len())]
    UploadsRejected(Vec<UploadFailure>),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A created announcement plus the files that could not be hosted.
#[derive(Debug)]
pub struct Posted {
    pub record: AnnouncementRecord,
    pub failures: Vec<UploadFailure>,
}

#[derive(Clone)]
pub struct ComposerService {
    writer: Arc<dyn AnnouncementsWriteRepo>,
    uploader: ImageUploader,
}

impl ComposerService {
    pub fn new(writer: Arc<dyn AnnouncementsWriteRepo>, uploader: ImageUploader) -> Self {
        Self { writer, uploader }
    }

    /// Validate, host the staged images, then persist.
    ///
    /// Blank text is rejected before any upload or store call.
    #[instrument(skip(self, text, staged), fields(staged = staged.len()))]
    pub async fn post(&self, text: &str, staged: &StagedImages) -> Result<Posted, ComposerError> {
        let text = AnnouncementText::parse(text)?;

        let report = self.uploader.upload_all(staged).await;
        let failures = report.failures();
        if !failures.is_empty() && self.uploader.policy() == PartialUploadPolicy::Reject {
            return Err(ComposerError::UploadsRejected(failures));
        }

        let record = self
            .writer
            .create_announcement(CreateAnnouncementParams {
                text: text.into_inner(),
                images: normalize_images(report.hosted_urls()),
            })
            .await?;

        info!(
            target = "noticeboard::composer",
            id = %record.id,
            images = record.image_list().len(),
            failed = failures.len(),
            "announcement posted"
        );

        Ok(Posted { record, failures })
    }
}
