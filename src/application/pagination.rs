//! Cursor pagination helpers for the announcement feed.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct AnnouncementCursorPayload {
    #[serde(with = "time::serde::rfc3339")]
    date: OffsetDateTime,
    id: Uuid,
}

/// Position of the last announcement seen, in `date DESC, id DESC` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnouncementCursor {
    date: OffsetDateTime,
    id: Uuid,
}

impl AnnouncementCursor {
    pub fn new(date: OffsetDateTime, id: Uuid) -> Self {
        Self { date, id }
    }

    pub fn date(&self) -> OffsetDateTime {
        self.date
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn encode(&self) -> String {
        let payload = AnnouncementCursorPayload {
            date: self.date,
            id: self.id,
        };
        // A struct of a timestamp and a uuid always serializes.
        let serialized = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(serialized)
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: AnnouncementCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        Ok(Self {
            date: payload.date,
            id: payload.id,
        })
    }
}

/// Cursor-aware pagination request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<C> {
    pub limit: u32,
    pub cursor: Option<C>,
}

impl<C> PageRequest<C> {
    pub fn new(limit: u32, cursor: Option<C>) -> Self {
        Self { limit, cursor }
    }
}

/// Cursor-aware page result. `next_cursor` is only set when another page exists.
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}
