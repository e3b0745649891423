//! Reading the composer and editor forms.

use axum::http::StatusCode;
use axum_extra::extract::Multipart;
use axum_extra::extract::multipart::{Field, MultipartError};
use thiserror::Error;

use crate::domain::staging::{StagedImage, StagedImages};
use crate::util::bytes::human_size;

const TEXT_FIELD: &str = "text";
const RETAINED_FIELD: &str = "retained";
const IMAGES_FIELD: &str = "images";

/// Everything the board forms can submit. Unknown fields are ignored.
#[derive(Debug, Default)]
pub(crate) struct BoardForm {
    pub text: String,
    pub retained: Vec<String>,
    pub staged: StagedImages,
    /// Files that were not images and were left out of `staged`.
    pub skipped: Vec<String>,
}

#[derive(Debug, Error)]
pub(crate) enum FormError {
    #[error("request body exceeds {limit}")]
    TooLarge { limit: String },
    #[error("form data could not be read: {0}")]
    Invalid(String),
}

impl FormError {
    fn from_multipart(err: MultipartError, limit_bytes: u64) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => FormError::TooLarge {
                limit: human_size(limit_bytes),
            },
            _ => FormError::Invalid(err.body_text()),
        }
    }

    pub(crate) fn user_message(&self) -> String {
        match self {
            FormError::TooLarge { limit } => {
                format!("The selected images are too large (limit is {limit} per request).")
            }
            FormError::Invalid(_) => "The form could not be read, please retry.".to_string(),
        }
    }
}

pub(crate) async fn read_board_form(
    multipart: &mut Multipart,
    limit_bytes: u64,
) -> Result<BoardForm, FormError> {
    let mut form = BoardForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(FormError::from_multipart(err, limit_bytes)),
        };

        match field.name() {
            Some(TEXT_FIELD) => {
                form.text = field
                    .text()
                    .await
                    .map_err(|err| FormError::from_multipart(err, limit_bytes))?;
            }
            Some(RETAINED_FIELD) => {
                let url = field
                    .text()
                    .await
                    .map_err(|err| FormError::from_multipart(err, limit_bytes))?;
                let url = url.trim();
                if !url.is_empty() {
                    form.retained.push(url.to_string());
                }
            }
            Some(IMAGES_FIELD) => {
                read_image(field, &mut form, limit_bytes).await?;
            }
            _ => continue,
        }
    }

    Ok(form)
}

async fn read_image(field: Field, form: &mut BoardForm, limit_bytes: u64) -> Result<(), FormError> {
    let filename = field
        .file_name()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let declared_type = field.content_type().map(|mime| mime.to_string());

    let data = field
        .bytes()
        .await
        .map_err(|err| FormError::from_multipart(err, limit_bytes))?;

    // An untouched file input still submits one empty, nameless part.
    let Some(filename) = filename else {
        return Ok(());
    };
    if data.is_empty() {
        return Ok(());
    }

    let content_type = declared_type
        .filter(|value| value.starts_with("image/"))
        .or_else(|| {
            mime_guess::from_path(&filename)
                .first()
                .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
                .map(|mime| mime.essence_str().to_string())
        });

    match content_type {
        Some(content_type) => {
            form.staged
                .push(StagedImage::new(filename, content_type, data));
        }
        None => form.skipped.push(filename),
    }
    Ok(())
}
