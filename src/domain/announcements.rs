//! Announcement records and the invariants every stored announcement keeps.

use std::fmt::Write as _;

use serde::Serialize;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use super::error::DomainError;

/// A stored announcement as read back from persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncementRecord {
    pub id: Uuid,
    pub text: String,
    pub images: Option<Vec<String>>,
    pub date: OffsetDateTime,
}

impl AnnouncementRecord {
    /// Ordered image URLs, empty when the record carries none.
    pub fn image_list(&self) -> &[String] {
        self.images.as_deref().unwrap_or_default()
    }
}

/// Announcement body text that is guaranteed to be non-blank once trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementText(String);

impl AnnouncementText {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::BlankText);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Collapse an image list into the stored shape: absent, or a non-empty ordered list.
pub fn normalize_images(images: Vec<String>) -> Option<Vec<String>> {
    let images: Vec<String> = images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();
    (!images.is_empty()).then_some(images)
}

/// Accept an already-hosted image URL only when it is absolute http(s).
pub fn parse_hosted_url(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|_| DomainError::invalid_image_url(trimmed))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.into()),
        _ => Err(DomainError::invalid_image_url(trimmed)),
    }
}

/// Render announcement text as HTML: everything escaped, line breaks kept and
/// bare http(s) links made clickable.
pub fn format_text_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push_str("<br>");
        }
        linkify_line(line.trim_end_matches('\r'), &mut out);
    }
    out
}

fn linkify_line(line: &str, out: &mut String) {
    let mut rest = line;
    while let Some(start) = find_link_start(rest) {
        let (before, tail) = rest.split_at(start);
        out.push_str(&ammonia::clean_text(before));

        let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
        let (link, after) = tail.split_at(end);
        let escaped = ammonia::clean_text(link);
        let _ = write!(
            out,
            r#"<a href="{escaped}" target="_blank" rel="noopener noreferrer">{escaped}</a>"#
        );
        rest = after;
    }
    out.push_str(&ammonia::clean_text(rest));
}

fn find_link_start(value: &str) -> Option<usize> {
    [value.find("http://"), value.find("https://")]
        .into_iter()
        .flatten()
        .min()
}
