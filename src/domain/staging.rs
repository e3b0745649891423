//! Image files selected locally but not yet sent to the image host.

use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl StagedImage {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Ordered staging set. A file name is staged at most once and empty parts
/// (an untouched file input) are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedImages {
    items: Vec<StagedImage>,
}

impl StagedImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the image was skipped.
    pub fn push(&mut self, image: StagedImage) -> bool {
        if image.data.is_empty() || self.items.iter().any(|i| i.filename == image.filename) {
            return false;
        }
        self.items.push(image);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedImage> {
        self.items.iter()
    }
}

impl FromIterator<StagedImage> for StagedImages {
    fn from_iter<I: IntoIterator<Item = StagedImage>>(iter: I) -> Self {
        let mut staged = Self::new();
        for image in iter {
            staged.push(image);
        }
        staged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, body: &'static [u8]) -> StagedImage {
        StagedImage::new(name, "image/png", Bytes::from_static(body))
    }

    #[test]
    fn duplicate_names_are_staged_once() {
        let staged: StagedImages = [image("a.png", b"1"), image("b.png", b"2"), image("a.png", b"3")]
            .into_iter()
            .collect();

        let names: Vec<_> = staged.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, ["a.png", "b.png"]);
        assert_eq!(
            staged.iter().next().map(|i| i.data.clone()),
            Some(Bytes::from_static(b"1"))
        );
    }

    #[test]
    fn empty_parts_are_skipped() {
        let mut staged = StagedImages::new();
        assert!(!staged.push(image("", b"")));
        assert!(staged.is_empty());
    }
}
