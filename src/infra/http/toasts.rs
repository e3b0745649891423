use axum::response::Response;
use datastar::prelude::ElementPatchMode;

use crate::application::error::HttpError;
use crate::application::stream::StreamBuilder;
use crate::presentation::views::{ToastKind, ToastTemplate, ToastView, render_fragment};

pub(crate) const TOAST_STACK: &str = "#toast-stack";

pub(crate) fn push_toast(
    stream: &mut StreamBuilder,
    kind: ToastKind,
    message: impl Into<String>,
) -> Result<(), HttpError> {
    let html = render_fragment(ToastTemplate {
        toast: ToastView::new(kind, message),
    })?;
    stream.push_patch(html, TOAST_STACK, ElementPatchMode::Append);
    Ok(())
}

/// A response that only shows a toast.
pub(crate) fn toast_response(kind: ToastKind, message: impl Into<String>) -> Response {
    let mut stream = StreamBuilder::new();
    match push_toast(&mut stream, kind, message) {
        Ok(()) => stream.into_response(),
        Err(err) => axum::response::IntoResponse::into_response(err),
    }
}

/// Join failed file names for a toast, e.g. "a.png, b.png".
pub(crate) fn file_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().collect::<Vec<_>>().join(", ")
}
