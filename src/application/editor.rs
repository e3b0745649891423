//! Editing and deleting existing announcements.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::images::{ImageUploader, PartialUploadPolicy, UploadFailure};
use crate::application::repos::{
    AnnouncementsRepo, AnnouncementsWriteRepo, RepoError, UpdateAnnouncementParams,
};
use crate::domain::announcements::{AnnouncementRecord, AnnouncementText, parse_hosted_url};
use crate::domain::editing::EditSession;
use crate::domain::error::DomainError;
use crate::domain::staging::StagedImages;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("announcement `{0}` does not exist")]
    NotFound(Uuid),
    #[error("{} image(s) failed to upload", .0.len())]
    UploadsRejected(Vec<UploadFailure>),
    #[error(transparent)]
    Repo(RepoError),
}

#[derive(Debug)]
pub struct Saved {
    pub record: AnnouncementRecord,
    pub failures: Vec<UploadFailure>,
}

#[derive(Clone)]
pub struct EditorService {
    reader: Arc<dyn AnnouncementsRepo>,
    writer: Arc<dyn AnnouncementsWriteRepo>,
    uploader: ImageUploader,
}

impl EditorService {
    pub fn new(
        reader: Arc<dyn AnnouncementsRepo>,
        writer: Arc<dyn AnnouncementsWriteRepo>,
        uploader: ImageUploader,
    ) -> Self {
        Self {
            reader,
            writer,
            uploader,
        }
    }

    /// Start a session from the stored record.
    pub async fn open(&self, id: Uuid) -> Result<EditSession, EditorError> {
        let record = self
            .reader
            .find_announcement(id)
            .await
            .map_err(EditorError::Repo)?
            .ok_or(EditorError::NotFound(id))?;
        Ok(EditSession::open(&record))
    }

    /// Rebuild a session from submitted form state. Retained entries must be
    /// hosted http(s) URLs.
    pub fn resume(
        &self,
        id: Uuid,
        text: String,
        retained: Vec<String>,
        staged: StagedImages,
    ) -> Result<EditSession, EditorError> {
        let retained = retained
            .iter()
            .map(|url| parse_hosted_url(url))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EditSession::resume(id, text, retained, staged))
    }

    /// Upload staged files, then overwrite text and images in one write.
    ///
    /// Concurrent saves of the same announcement are last-write-wins.
    #[instrument(skip(self, session), fields(id = %session.id(), staged = session.staged().len()))]
    pub async fn save(&self, session: &EditSession) -> Result<Saved, EditorError> {
        let text = AnnouncementText::parse(session.text())?;

        let report = self.uploader.upload_all(session.staged()).await;
        let failures = report.failures();
        if !failures.is_empty() && self.uploader.policy() == PartialUploadPolicy::Reject {
            return Err(EditorError::UploadsRejected(failures));
        }

        let record = self
            .writer
            .update_announcement(UpdateAnnouncementParams {
                id: session.id(),
                text: text.into_inner(),
                images: session.compose_images(report.hosted_urls()),
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => EditorError::NotFound(session.id()),
                other => EditorError::Repo(other),
            })?;

        info!(
            target = "noticeboard::editor",
            id = %record.id,
            images = record.image_list().len(),
            failed = failures.len(),
            "announcement updated"
        );

        Ok(Saved { record, failures })
    }

    /// Remove an announcement. Deleting one that is already gone succeeds.
    pub async fn delete(&self, id: Uuid) -> Result<(), EditorError> {
        self.writer
            .delete_announcement(id)
            .await
            .map_err(EditorError::Repo)?;
        info!(target = "noticeboard::editor", id = %id, "announcement deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use time::OffsetDateTime;

    use super::*;
    use crate::application::feed::testing::MemoryAnnouncements;
    use crate::application::images::testing::FakeImageHost;
    use crate::domain::staging::StagedImage;

    fn editor(
        repo: Arc<MemoryAnnouncements>,
        host: Arc<FakeImageHost>,
        policy: PartialUploadPolicy,
    ) -> EditorService {
        EditorService::new(repo.clone(), repo, ImageUploader::new(host, policy))
    }

    fn seed(repo: &MemoryAnnouncements, images: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        repo.insert(AnnouncementRecord {
            id,
            text: "Muster at the bow".into(),
            images: (!images.is_empty())
                .then(|| images.iter().map(|url| url.to_string()).collect()),
            date: OffsetDateTime::now_utc(),
        });
        id
    }

    fn png(name: &str) -> StagedImage {
        StagedImage::new(name, "image/png", Bytes::from_static(b"png"))
    }

    #[tokio::test]
    async fn remove_then_add_composes_retained_then_new() {
        let repo = Arc::new(MemoryAnnouncements::default());
        let id = seed(
            &repo,
            &["https://i.test/a", "https://i.test/b", "https://i.test/c"],
        );
        let service = editor(
            repo.clone(),
            Arc::new(FakeImageHost::default()),
            PartialUploadPolicy::Proceed,
        );

        let mut session = service.open(id).await.expect("opened");
        session.remove_image(1);
        session.stage(png("new.png"));
        let saved = service.save(&session).await.expect("saved");

        assert_eq!(
            saved.record.image_list(),
            [
                "https://i.test/a",
                "https://i.test/c",
                "https://img.test/new.png"
            ]
        );
        assert_eq!(repo.get(id).expect("stored").images, saved.record.images);
    }

    #[tokio::test]
    async fn saving_with_unchanged_text_and_no_files_keeps_record() {
        let repo = Arc::new(MemoryAnnouncements::default());
        let id = seed(&repo, &["https://i.test/a"]);
        let host = Arc::new(FakeImageHost::default());
        let service = editor(repo.clone(), host.clone(), PartialUploadPolicy::Proceed);

        let session = service.open(id).await.expect("opened");
        let saved = service.save(&session).await.expect("saved");

        assert_eq!(saved.record.text, "Muster at the bow");
        assert_eq!(saved.record.image_list(), ["https://i.test/a"]);
        assert_eq!(host.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_writes() {
        let repo = Arc::new(MemoryAnnouncements::default());
        let id = seed(&repo, &[]);
        let host = Arc::new(FakeImageHost::default());
        let service = editor(repo.clone(), host.clone(), PartialUploadPolicy::Proceed);

        let mut staged = StagedImages::new();
        staged.push(png("x.png"));
        let session = service
            .resume(id, "   ".into(), Vec::new(), staged)
            .expect("resumed");
        let result = service.save(&session).await;

        assert!(matches!(
            result,
            Err(EditorError::Domain(DomainError::BlankText))
        ));
        assert_eq!(repo.write_count(), 0);
        assert_eq!(host.call_count(), 0);
    }

    #[tokio::test]
    async fn opening_missing_record_is_not_found() {
        let repo = Arc::new(MemoryAnnouncements::default());
        let service = editor(
            repo,
            Arc::new(FakeImageHost::default()),
            PartialUploadPolicy::Proceed,
        );
        let id = Uuid::new_v4();
        assert!(matches!(service.open(id).await, Err(EditorError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn saving_deleted_record_is_not_found() {
        let repo = Arc::new(MemoryAnnouncements::default());
        let service = editor(
            repo,
            Arc::new(FakeImageHost::default()),
            PartialUploadPolicy::Proceed,
        );
        let session = service
            .resume(Uuid::new_v4(), "still here?".into(), Vec::new(), StagedImages::new())
            .expect("resumed");
        assert!(matches!(
            service.save(&session).await,
            Err(EditorError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn tampered_retained_url_is_refused() {
        let repo = Arc::new(MemoryAnnouncements::default());
        let service = editor(
            repo,
            Arc::new(FakeImageHost::default()),
            PartialUploadPolicy::Proceed,
        );
        let result = service.resume(
            Uuid::new_v4(),
            "text".into(),
            vec!["javascript:alert(1)".into()],
            StagedImages::new(),
        );
        assert!(matches!(
            result,
            Err(EditorError::Domain(DomainError::InvalidImageUrl { .. }))
        ));
    }

    #[tokio::test]
    async fn reject_policy_leaves_record_untouched() {
        let repo = Arc::new(MemoryAnnouncements::default());
        let id = seed(&repo, &["https://i.test/a"]);
        let service = editor(
            repo.clone(),
            Arc::new(FakeImageHost::failing(&["bad.png"])),
            PartialUploadPolicy::Reject,
        );

        let mut session = service.open(id).await.expect("opened");
        session.remove_image(0);
        session.stage(png("bad.png"));

        assert!(matches!(
            service.save(&session).await,
            Err(EditorError::UploadsRejected(_))
        ));
        assert_eq!(repo.write_count(), 0);
        assert_eq!(
            repo.get(id).expect("stored").image_list(),
            ["https://i.test/a"]
        );
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = Arc::new(MemoryAnnouncements::default());
        let id = seed(&repo, &[]);
        let service = editor(
            repo.clone(),
            Arc::new(FakeImageHost::default()),
            PartialUploadPolicy::Proceed,
        );

        service.delete(id).await.expect("first delete");
        service.delete(id).await.expect("second delete");
        assert!(repo.get(id).is_none());
    }
}
