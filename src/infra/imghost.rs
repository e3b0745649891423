//! Client for an imgbb-compatible image host.
//!
//! Each file is posted on its own as multipart field `image`, authenticated
//! with the `key` query parameter. The host answers with
//! `{ "success": bool, "data": { "url": "..." } }`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::application::images::{ImageHost, ImageHostError};
use crate::domain::announcements::parse_hosted_url;
use crate::domain::staging::StagedImage;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct ImgbbClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl ImgbbClient {
    pub fn new(client: reqwest::Client, endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key: api_key.into(),
        }
    }

    fn upload_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);
        url
    }
}

#[async_trait]
impl ImageHost for ImgbbClient {
    async fn upload(&self, image: &StagedImage) -> Result<String, ImageHostError> {
        let mut part = Part::bytes(image.data.to_vec()).file_name(image.filename.clone());
        if !image.content_type.is_empty() {
            part = part
                .mime_str(&image.content_type)
                .map_err(|err| ImageHostError::Transport(err.to_string()))?;
        }
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|err| ImageHostError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ImageHostError::Transport(err.without_url().to_string()))?;

        let parsed: Option<UploadResponse> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            return Err(match parsed.and_then(|p| p.error).and_then(|e| e.message) {
                Some(message) => ImageHostError::Rejected(message),
                None => ImageHostError::Status {
                    status: status.as_u16(),
                },
            });
        }

        let parsed = parsed.ok_or_else(|| {
            ImageHostError::Decode("response body is not the expected JSON".to_string())
        })?;

        if !parsed.success {
            let message = parsed
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "success flag was false".to_string());
            return Err(ImageHostError::Rejected(message));
        }

        let url = parsed
            .data
            .map(|data| data.url)
            .ok_or_else(|| ImageHostError::Decode("response is missing data.url".to_string()))?;

        parse_hosted_url(&url).map_err(|err| ImageHostError::Decode(err.to_string()))
    }
}

/// Stand-in used when no API key is configured. Every upload fails, so posts
/// fall back to the partial-failure policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledImageHost;

#[async_trait]
impl ImageHost for DisabledImageHost {
    async fn upload(&self, _image: &StagedImage) -> Result<String, ImageHostError> {
        Err(ImageHostError::Rejected(
            "image uploads are not configured".to_string(),
        ))
    }
}
