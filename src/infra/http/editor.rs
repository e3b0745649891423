use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use datastar::prelude::ElementPatchMode;
use serde::Deserialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::editor::{EditorError, Saved};
use crate::application::error::HttpError;
use crate::application::stream::StreamBuilder;
use crate::domain::editing::EditSession;
use crate::domain::staging::StagedImages;
use crate::presentation::views::{
    AnnouncementCardTemplate, EditRetainedTemplate, EditorModalTemplate, EditorView,
    StagedPreviewsTemplate, StagedPreviewsView, ToastKind, card_dom_id, render_fragment,
};

use super::BoardState;
use super::multipart::{BoardForm, read_board_form};
use super::toasts::{file_list, push_toast, toast_response};

const SOURCE: &str = "noticeboard::http::editor";
const EDIT_MODAL: &str = "#edit-modal";
const EDIT_RETAINED: &str = "#edit-retained";
const EDIT_STAGED: &str = "#edit-staged";

#[derive(Debug, Deserialize)]
pub(super) struct RemoveQuery {
    index: usize,
}

fn card_selector(id: Uuid) -> String {
    format!("#{}", card_dom_id(id))
}

fn editor_view(session: &EditSession) -> EditorView {
    EditorView::new(session.id(), session.text(), session.retained())
}

async fn read_form(state: &BoardState, multipart: &mut Multipart) -> Result<BoardForm, Response> {
    read_board_form(multipart, state.upload_limit_bytes)
        .await
        .map_err(|err| {
            warn!(target = SOURCE, error = %err, "rejected editor form");
            toast_response(ToastKind::Error, err.user_message())
        })
}

/// The announcement vanished under us: tell the captain and drop its stale card.
fn vanished_response(id: Uuid, close_modal: bool) -> Response {
    let mut stream = StreamBuilder::new();
    stream.push_remove(&card_selector(id));
    if close_modal {
        stream.push_signals(r#"{"editing":false}"#);
    }
    match push_toast(
        &mut stream,
        ToastKind::Error,
        "This announcement no longer exists.",
    ) {
        Ok(()) => stream.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(super) async fn open_editor(State(state): State<BoardState>, Path(id): Path<Uuid>) -> Response {
    let session = match state.editor.open(id).await {
        Ok(session) => session,
        Err(EditorError::NotFound(_)) => return vanished_response(id, false),
        Err(err) => {
            error!(target = SOURCE, id = %id, error = %err, "failed to open editor");
            return toast_response(
                ToastKind::Error,
                "Could not open the announcement. Please try again.",
            );
        }
    };

    let html = match render_fragment(EditorModalTemplate {
        editor: editor_view(&session),
    }) {
        Ok(html) => html,
        Err(err) => return err.into_response(),
    };

    let mut stream = StreamBuilder::new();
    stream.push_patch(html, EDIT_MODAL, ElementPatchMode::Replace);
    stream.push_signals(r#"{"editing":true}"#);
    stream.into_response()
}

/// Drop one hosted image from the session and re-render only the retained list.
pub(super) async fn remove_image(
    State(state): State<BoardState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RemoveQuery>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_form(&state, &mut multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let mut session = match state
        .editor
        .resume(id, form.text, form.retained, StagedImages::new())
    {
        Ok(session) => session,
        Err(err) => return HttpError::from(err).into_response(),
    };
    session.remove_image(query.index);

    match render_fragment(EditRetainedTemplate {
        editor: editor_view(&session),
    }) {
        Ok(html) => {
            let mut stream = StreamBuilder::new();
            stream.push_patch(html, EDIT_RETAINED, ElementPatchMode::Replace);
            stream.into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(super) async fn preview_staged(
    State(state): State<BoardState>,
    Path(_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_form(&state, &mut multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let view = StagedPreviewsView::editor(&form.staged);
    match render_fragment(StagedPreviewsTemplate { staged: view }) {
        Ok(html) => {
            let mut stream = StreamBuilder::new();
            stream.push_patch(html, EDIT_STAGED, ElementPatchMode::Replace);
            stream.into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(super) async fn save_edit(
    State(state): State<BoardState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_form(&state, &mut multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let skipped = form.skipped;

    let session = match state
        .editor
        .resume(id, form.text, form.retained, form.staged)
    {
        Ok(session) => session,
        Err(err) => return HttpError::from(err).into_response(),
    };

    match state.editor.save(&session).await {
        Ok(saved) => match saved_response(&state, saved, &skipped) {
            Ok(stream) => stream.into_response(),
            Err(err) => err.into_response(),
        },
        Err(EditorError::NotFound(_)) => vanished_response(id, true),
        Err(EditorError::Domain(err)) => {
            toast_response(ToastKind::Warning, format!("Not saved: {err}."))
        }
        Err(EditorError::UploadsRejected(failures)) => toast_response(
            ToastKind::Error,
            format!(
                "Could not upload {}. Changes were not saved.",
                file_list(failures.iter().map(|f| f.filename.as_str()))
            ),
        ),
        Err(EditorError::Repo(err)) => {
            error!(target = SOURCE, id = %id, error = %err, "failed to update announcement");
            toast_response(
                ToastKind::Error,
                "Could not save the announcement. Please try again.",
            )
        }
    }
}

fn saved_response(
    state: &BoardState,
    saved: Saved,
    skipped: &[String],
) -> Result<StreamBuilder, HttpError> {
    let Saved { record, failures } = saved;
    let selector = card_selector(record.id);
    let card = state.feed.card(&record);

    let mut stream = StreamBuilder::new();
    stream.push_patch(
        render_fragment(AnnouncementCardTemplate { card })?,
        &selector,
        ElementPatchMode::Replace,
    );
    stream.push_signals(r#"{"editing":false}"#);

    if failures.is_empty() && skipped.is_empty() {
        push_toast(&mut stream, ToastKind::Success, "Announcement updated.")?;
    } else {
        let left_out = failures
            .iter()
            .map(|f| f.filename.as_str())
            .chain(skipped.iter().map(String::as_str));
        push_toast(
            &mut stream,
            ToastKind::Warning,
            format!("Announcement updated without {}.", file_list(left_out)),
        )?;
    }

    Ok(stream)
}

pub(super) async fn delete_announcement(
    State(state): State<BoardState>,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(err) = state.editor.delete(id).await {
        error!(target = SOURCE, id = %id, error = %err, "failed to delete announcement");
        return toast_response(
            ToastKind::Error,
            "Could not delete the announcement. Please try again.",
        );
    }

    let mut stream = StreamBuilder::new();
    stream.push_remove(&card_selector(id));
    match push_toast(&mut stream, ToastKind::Success, "Announcement deleted.") {
        Ok(()) => stream.into_response(),
        Err(err) => err.into_response(),
    }
}
