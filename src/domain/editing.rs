//! Edit-session state for a single announcement.
//!
//! A session keeps the images that are already hosted apart from the files
//! staged during the session, so saving can upload only the new files and
//! still write the final list in retained-then-new order.

use uuid::Uuid;

use super::announcements::{AnnouncementRecord, normalize_images};
use super::staging::{StagedImage, StagedImages};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    id: Uuid,
    text: String,
    retained: Vec<String>,
    staged: StagedImages,
}

impl EditSession {
    pub fn open(record: &AnnouncementRecord) -> Self {
        Self {
            id: record.id,
            text: record.text.clone(),
            retained: record.image_list().to_vec(),
            staged: StagedImages::new(),
        }
    }

    /// Rebuild a session from what the edit form submitted.
    pub fn resume(id: Uuid, text: String, retained: Vec<String>, staged: StagedImages) -> Self {
        Self {
            id,
            text,
            retained,
            staged,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn retained(&self) -> &[String] {
        &self.retained
    }

    pub fn staged(&self) -> &StagedImages {
        &self.staged
    }

    /// Drop the hosted image at `index`. Out-of-range indexes leave the session untouched.
    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        (index < self.retained.len()).then(|| self.retained.remove(index))
    }

    pub fn stage(&mut self, image: StagedImage) -> bool {
        self.staged.push(image)
    }

    /// Final image list once the staged files have been hosted at `new_urls`.
    pub fn compose_images(&self, new_urls: Vec<String>) -> Option<Vec<String>> {
        let mut images = self.retained.clone();
        images.extend(new_urls);
        normalize_images(images)
    }
}
