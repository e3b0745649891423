use std::sync::Arc;

use chrono_tz::Tz;
use thiserror::Error;
use tracing::debug;

use crate::application::pagination::{AnnouncementCursor, PageRequest};
use crate::application::repos::{AnnouncementsRepo, RepoError};
use crate::domain::announcements::{AnnouncementRecord, format_text_html};
use crate::domain::lightbox;
use crate::presentation::views::{AnnouncementCard, CardImage, FeedLoaderView, LightboxFrameView};
use crate::util::timezone;

pub const DEFAULT_PAGE_SIZE: u32 = 5;
const MAX_PAGE_SIZE: u32 = 50;

/// Where the feed stands after a page has been rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedProgress {
    /// Nothing came back; the load-more control stays hidden.
    Empty,
    /// The last page was rendered; the load-more control is hidden.
    Exhausted,
    /// Another page exists after `cursor`.
    More { cursor: String },
}

impl FeedProgress {
    pub fn next_cursor(&self) -> Option<&str> {
        match self {
            FeedProgress::More { cursor } => Some(cursor),
            FeedProgress::Empty | FeedProgress::Exhausted => None,
        }
    }
}

pub struct FeedPage {
    pub cards: Vec<AnnouncementCard>,
    pub progress: FeedProgress,
}

impl FeedPage {
    pub fn loader(&self) -> FeedLoaderView {
        FeedLoaderView {
            next_cursor: self.progress.next_cursor().map(str::to_string),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Renders the newest-first announcement feed one page at a time.
#[derive(Clone)]
pub struct FeedService {
    announcements: Arc<dyn AnnouncementsRepo>,
    page_size: u32,
    timezone: Tz,
}

impl FeedService {
    pub fn new(announcements: Arc<dyn AnnouncementsRepo>, page_size: u32, timezone: Tz) -> Self {
        Self {
            announcements,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            timezone,
        }
    }

    fn decode_cursor(&self, cursor: Option<&str>) -> Result<Option<AnnouncementCursor>, FeedError> {
        cursor
            .filter(|value| !value.is_empty())
            .map(AnnouncementCursor::decode)
            .transpose()
            .map_err(|err| FeedError::InvalidCursor(err.to_string()))
    }

    /// Load one page. Without a cursor this is a fresh load from the newest record.
    pub async fn load_page(&self, cursor: Option<&str>) -> Result<FeedPage, FeedError> {
        let cursor = self.decode_cursor(cursor)?;
        let page = self
            .announcements
            .list_announcements(PageRequest::new(self.page_size, cursor))
            .await?;

        let progress = if page.is_empty() {
            FeedProgress::Empty
        } else {
            match page.next_cursor {
                Some(cursor) => FeedProgress::More { cursor },
                None => FeedProgress::Exhausted,
            }
        };

        debug!(
            target = "noticeboard::feed",
            count = page.items.len(),
            progress = ?progress,
            "feed page loaded"
        );

        let cards = page
            .items
            .iter()
            .map(|record| self.card(record))
            .collect();

        Ok(FeedPage { cards, progress })
    }

    /// Build the view for a single record, e.g. right after it was created or edited.
    pub fn card(&self, record: &AnnouncementRecord) -> AnnouncementCard {
        record_to_card(record, self.timezone)
    }
}

pub(crate) fn record_to_card(record: &AnnouncementRecord, tz: Tz) -> AnnouncementCard {
    let localized = timezone::localized_datetime(record.date, tz);
    let id = record.id.to_string();

    let images = record
        .image_list()
        .iter()
        .enumerate()
        .map(|(index, url)| CardImage {
            index,
            url: url.clone(),
        })
        .collect();

    let lightbox = lightbox::frames(record.image_list())
        .into_iter()
        .map(|frame| LightboxFrameView::new(&id, frame))
        .collect();

    AnnouncementCard {
        id,
        text_html: format_text_html(&record.text),
        images,
        lightbox,
        iso_date: localized.to_rfc3339(),
        display_date: timezone::format_display(&localized),
    }
}
