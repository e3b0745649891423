use crate::application::error::{ErrorReport, HttpError};
use crate::domain::lightbox::LightboxFrame;
use crate::domain::staging::{StagedImage, StagedImages};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

/// Render a fragment for an SSE patch.
pub fn render_fragment<T: Template>(template: T) -> Result<String, HttpError> {
    render_template(template).map(|html| html.0)
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(title: &str) -> Response {
    let mut response = render_template_response(
        ErrorTemplate {
            title: title.to_string(),
            status: StatusCode::NOT_FOUND.as_u16(),
            message: "Nothing to see here.".to_string(),
        },
        StatusCode::NOT_FOUND,
    );
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone, Debug)]
pub struct CardImage {
    pub index: usize,
    pub url: String,
}

/// One lightbox frame. `key` is the value of the `viewer` signal that shows it.
#[derive(Clone, Debug)]
pub struct LightboxFrameView {
    pub key: String,
    pub url: String,
    pub position: String,
    pub prev_key: Option<String>,
    pub next_key: Option<String>,
}

impl LightboxFrameView {
    pub fn new(announcement_id: &str, frame: LightboxFrame) -> Self {
        let key = |index: usize| format!("{announcement_id}:{index}");
        Self {
            key: key(frame.index),
            position: (frame.index + 1).to_string(),
            prev_key: frame.has_prev().then(|| key(frame.prev)),
            next_key: frame.has_next().then(|| key(frame.next)),
            url: frame.url,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnnouncementCard {
    pub id: String,
    pub text_html: String,
    pub images: Vec<CardImage>,
    pub lightbox: Vec<LightboxFrameView>,
    pub iso_date: String,
    pub display_date: String,
}

impl AnnouncementCard {
    pub fn dom_id(&self) -> String {
        card_dom_id(&self.id)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

pub fn card_dom_id(id: impl std::fmt::Display) -> String {
    format!("announcement-{id}")
}

#[derive(Clone, Debug, Default)]
pub struct FeedLoaderView {
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ComposerView {
    pub size_hint: String,
}

#[derive(Clone, Debug)]
pub struct BoardView {
    pub title: String,
    pub identity: String,
    pub cards: Vec<AnnouncementCard>,
    pub loader: FeedLoaderView,
    pub composer: ComposerView,
}

#[derive(Clone, Debug)]
pub struct StagedPreview {
    pub filename: String,
    pub data_url: String,
}

impl StagedPreview {
    pub fn from_image(image: &StagedImage) -> Self {
        let content_type = if image.content_type.starts_with("image/") {
            image.content_type.clone()
        } else {
            mime_guess::from_path(&image.filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        };
        Self {
            filename: image.filename.clone(),
            data_url: format!("data:{content_type};base64,{}", STANDARD.encode(&image.data)),
        }
    }
}

/// Inline thumbnails for files that are staged but not uploaded yet.
/// `form_id` names the form whose file input holds the staged files.
#[derive(Clone, Debug)]
pub struct StagedPreviewsView {
    pub target_id: &'static str,
    pub form_id: &'static str,
    pub previews: Vec<StagedPreview>,
}

impl StagedPreviewsView {
    pub fn composer(staged: &StagedImages) -> Self {
        Self::new("composer-previews", "composer-form", staged)
    }

    pub fn editor(staged: &StagedImages) -> Self {
        Self::new("edit-staged", "edit-form", staged)
    }

    fn new(target_id: &'static str, form_id: &'static str, staged: &StagedImages) -> Self {
        Self {
            target_id,
            form_id,
            previews: staged.iter().map(StagedPreview::from_image).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RetainedImageView {
    pub index: usize,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct EditorView {
    pub id: String,
    pub text: String,
    pub retained: Vec<RetainedImageView>,
}

impl EditorView {
    pub fn new(id: Uuid, text: &str, retained: &[String]) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            retained: retained
                .iter()
                .enumerate()
                .map(|(index, url)| RetainedImageView {
                    index,
                    url: url.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Warning => "warning",
            ToastKind::Error => "error",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ToastView {
    pub id: String,
    pub kind: &'static str,
    pub message: String,
}

impl ToastView {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            id: format!("toast-{}", Uuid::new_v4().simple()),
            kind: kind.as_str(),
            message: message.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub view: BoardView,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub status: u16,
    pub message: String,
}

#[derive(Template)]
#[template(path = "partials/announcement_card.html")]
pub struct AnnouncementCardTemplate {
    pub card: AnnouncementCard,
}

#[derive(Template)]
#[template(path = "partials/announcement_cards_append.html")]
pub struct AnnouncementCardsAppendTemplate {
    pub cards: Vec<AnnouncementCard>,
}

#[derive(Template)]
#[template(path = "partials/feed_loader.html")]
pub struct FeedLoaderTemplate {
    pub loader: FeedLoaderView,
}

#[derive(Template)]
#[template(path = "partials/composer.html")]
pub struct ComposerTemplate {
    pub composer: ComposerView,
}

#[derive(Template)]
#[template(path = "partials/staged_previews.html")]
pub struct StagedPreviewsTemplate {
    pub staged: StagedPreviewsView,
}

#[derive(Template)]
#[template(path = "partials/editor_modal.html")]
pub struct EditorModalTemplate {
    pub editor: EditorView,
}

#[derive(Template)]
#[template(path = "partials/edit_retained.html")]
pub struct EditRetainedTemplate {
    pub editor: EditorView,
}

#[derive(Template)]
#[template(path = "partials/toast.html")]
pub struct ToastTemplate {
    pub toast: ToastView,
}
