//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{AnnouncementCursor, CursorPage, PageRequest};
use crate::domain::announcements::AnnouncementRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateAnnouncementParams {
    pub text: String,
    pub images: Option<Vec<String>>,
}

/// Full replacement of an announcement's mutable fields.
#[derive(Debug, Clone)]
pub struct UpdateAnnouncementParams {
    pub id: Uuid,
    pub text: String,
    pub images: Option<Vec<String>>,
}

#[async_trait]
pub trait AnnouncementsRepo: Send + Sync {
    /// Newest first. An empty page is `Ok`, never an error.
    async fn list_announcements(
        &self,
        page: PageRequest<AnnouncementCursor>,
    ) -> Result<CursorPage<AnnouncementRecord>, RepoError>;

    async fn find_announcement(&self, id: Uuid) -> Result<Option<AnnouncementRecord>, RepoError>;
}

#[async_trait]
pub trait AnnouncementsWriteRepo: Send + Sync {
    async fn create_announcement(
        &self,
        params: CreateAnnouncementParams,
    ) -> Result<AnnouncementRecord, RepoError>;

    /// Returns [`RepoError::NotFound`] when the record no longer exists.
    async fn update_announcement(
        &self,
        params: UpdateAnnouncementParams,
    ) -> Result<AnnouncementRecord, RepoError>;

    /// Deleting an id that does not exist succeeds.
    async fn delete_announcement(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait AdminConfigRepo: Send + Sync {
    /// Email stored under the singleton `admin` key, if any.
    async fn load_admin_email(&self) -> Result<Option<String>, RepoError>;
}
