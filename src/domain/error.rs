use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("announcement text must not be blank")]
    BlankText,
    #[error("image url `{url}` is not an absolute http(s) url")]
    InvalidImageUrl { url: String },
}

impl DomainError {
    pub fn invalid_image_url(url: impl Into<String>) -> Self {
        Self::InvalidImageUrl { url: url.into() }
    }
}
