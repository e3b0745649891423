use axum::{
    Extension,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use datastar::prelude::ElementPatchMode;
use serde::Deserialize;
use tracing::error;

use crate::application::error::HttpError;
use crate::application::feed::FeedError;
use crate::application::guard::Identity;
use crate::application::stream::StreamBuilder;
use crate::presentation::views::{
    AnnouncementCardsAppendTemplate, BoardTemplate, BoardView, ComposerView,
    FeedLoaderTemplate, ToastKind, render_fragment, render_template_response,
};
use crate::util::bytes::human_size;

use super::BoardState;
use super::toasts::toast_response;

pub(super) const ANNOUNCEMENT_LIST: &str = "#announcement-list";
pub(super) const FEED_LOADER: &str = "#feed-loader";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CursorQuery {
    cursor: Option<String>,
}

pub(super) fn composer_view(state: &BoardState) -> ComposerView {
    ComposerView {
        size_hint: human_size(state.upload_limit_bytes),
    }
}

pub(super) async fn index(
    State(state): State<BoardState>,
    Extension(captain): Extension<Identity>,
) -> Response {
    let page = match state.feed.load_page(None).await {
        Ok(page) => page,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let view = BoardView {
        title: state.title.to_string(),
        identity: captain.email,
        loader: page.loader(),
        cards: page.cards,
        composer: composer_view(&state),
    };

    render_template_response(BoardTemplate { view }, StatusCode::OK)
}

pub(super) async fn load_more(
    State(state): State<BoardState>,
    Query(query): Query<CursorQuery>,
) -> Response {
    let page = match state.feed.load_page(query.cursor.as_deref()).await {
        Ok(page) => page,
        Err(FeedError::Repo(err)) => {
            error!(
                target = "noticeboard::http::board",
                error = %err,
                "failed to load announcements"
            );
            return toast_response(
                ToastKind::Error,
                "Could not load more announcements. Please try again.",
            );
        }
        Err(err) => return HttpError::from(err).into_response(),
    };

    let loader = page.loader();
    let mut stream = StreamBuilder::new();

    if !page.cards.is_empty() {
        let cards = match render_fragment(AnnouncementCardsAppendTemplate { cards: page.cards }) {
            Ok(html) => html,
            Err(err) => return err.into_response(),
        };
        stream.push_patch(cards, ANNOUNCEMENT_LIST, ElementPatchMode::Append);
    }

    let loader = match render_fragment(FeedLoaderTemplate { loader }) {
        Ok(html) => html,
        Err(err) => return err.into_response(),
    };
    stream.push_patch(loader, FEED_LOADER, ElementPatchMode::Replace);

    stream.into_response()
}
