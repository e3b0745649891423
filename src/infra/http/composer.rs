use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use datastar::prelude::ElementPatchMode;
use tracing::{error, warn};

use crate::application::composer::{ComposerError, Posted};
use crate::application::error::HttpError;
use crate::application::stream::StreamBuilder;
use crate::presentation::views::{
    AnnouncementCardTemplate, ComposerTemplate, StagedPreviewsTemplate, StagedPreviewsView,
    ToastKind, render_fragment,
};

use super::BoardState;
use super::board::{ANNOUNCEMENT_LIST, composer_view};
use super::multipart::read_board_form;
use super::toasts::{file_list, push_toast, toast_response};

const SOURCE: &str = "noticeboard::http::composer";
const COMPOSER: &str = "#composer";
const COMPOSER_PREVIEWS: &str = "#composer-previews";

pub(super) async fn post_announcement(
    State(state): State<BoardState>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_board_form(&mut multipart, state.upload_limit_bytes).await {
        Ok(form) => form,
        Err(err) => {
            warn!(target = SOURCE, error = %err, "rejected composer form");
            return toast_response(ToastKind::Error, err.user_message());
        }
    };

    match state.composer.post(&form.text, &form.staged).await {
        Ok(posted) => match posted_response(&state, posted, &form.skipped) {
            Ok(stream) => stream.into_response(),
            Err(err) => err.into_response(),
        },
        Err(ComposerError::Domain(err)) => {
            toast_response(ToastKind::Warning, format!("Nothing was posted: {err}."))
        }
        Err(ComposerError::UploadsRejected(failures)) => toast_response(
            ToastKind::Error,
            format!(
                "Could not upload {}. Nothing was posted.",
                file_list(failures.iter().map(|f| f.filename.as_str()))
            ),
        ),
        Err(ComposerError::Repo(err)) => {
            error!(target = SOURCE, error = %err, "failed to store announcement");
            toast_response(
                ToastKind::Error,
                "Could not post the announcement. Please try again.",
            )
        }
    }
}

fn posted_response(
    state: &BoardState,
    posted: Posted,
    skipped: &[String],
) -> Result<StreamBuilder, HttpError> {
    let Posted { record, failures } = posted;
    let card = state.feed.card(&record);

    let mut stream = StreamBuilder::new();
    stream.push_patch(
        render_fragment(AnnouncementCardTemplate { card })?,
        ANNOUNCEMENT_LIST,
        ElementPatchMode::Prepend,
    );
    stream.push_patch(
        render_fragment(ComposerTemplate {
            composer: composer_view(state),
        })?,
        COMPOSER,
        ElementPatchMode::Replace,
    );

    if failures.is_empty() && skipped.is_empty() {
        push_toast(&mut stream, ToastKind::Success, "Announcement posted.")?;
    } else {
        let left_out = failures
            .iter()
            .map(|f| f.filename.as_str())
            .chain(skipped.iter().map(String::as_str));
        push_toast(
            &mut stream,
            ToastKind::Warning,
            format!(
                "Announcement posted without {}.",
                file_list(left_out)
            ),
        )?;
    }

    Ok(stream)
}

/// Show thumbnails of the files currently selected in the composer.
pub(super) async fn preview_staged(
    State(state): State<BoardState>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_board_form(&mut multipart, state.upload_limit_bytes).await {
        Ok(form) => form,
        Err(err) => return toast_response(ToastKind::Error, err.user_message()),
    };

    let view = StagedPreviewsView::composer(&form.staged);
    let html = match render_fragment(StagedPreviewsTemplate { staged: view }) {
        Ok(html) => html,
        Err(err) => return err.into_response(),
    };

    let mut stream = StreamBuilder::new();
    stream.push_patch(html, COMPOSER_PREVIEWS, ElementPatchMode::Replace);
    if !form.skipped.is_empty()
        && let Err(err) = push_toast(
            &mut stream,
            ToastKind::Warning,
            format!("Not an image: {}.", file_list(form.skipped.iter().map(String::as_str))),
        )
    {
        return err.into_response();
    }
    stream.into_response()
}
