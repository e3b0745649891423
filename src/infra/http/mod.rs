mod board;
mod composer;
mod editor;
mod guard;
mod middleware;
mod multipart;
mod toasts;

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::application::composer::ComposerService;
use crate::application::editor::EditorService;
use crate::application::error::ErrorReport;
use crate::application::feed::FeedService;
use crate::application::guard::RoleGuard;
use crate::config::AuthSettings;
use crate::infra::{assets, db::PostgresRepositories};
use crate::presentation::views::render_not_found_response;

pub use middleware::{REQUEST_ID_HEADER, RequestContext};

const DATASTAR_REQUEST_HEADER: &str = "datastar-request";

#[derive(Clone)]
pub struct BoardState {
    pub title: Arc<str>,
    pub feed: Arc<FeedService>,
    pub composer: Arc<ComposerService>,
    pub editor: Arc<EditorService>,
    pub guard: RoleGuard,
    pub auth: Arc<AuthSettings>,
    pub upload_limit_bytes: u64,
    pub db: Option<Arc<PostgresRepositories>>,
}

pub fn build_router(state: BoardState) -> Router {
    let body_limit = usize::try_from(state.upload_limit_bytes).unwrap_or(usize::MAX);

    let write_routes = Router::new()
        .route("/announcements", post(composer::post_announcement))
        .route("/ui/composer/preview", post(composer::preview_staged))
        .route(
            "/announcements/{id}/delete",
            post(editor::delete_announcement),
        )
        .route(
            "/announcements/{id}/edit",
            get(editor::open_editor).post(editor::save_edit),
        )
        .route("/announcements/{id}/edit/remove", post(editor::remove_image))
        .route("/announcements/{id}/edit/preview", post(editor::preview_staged))
        .layer(DefaultBodyLimit::max(body_limit));

    let board_routes = Router::new()
        .route("/", get(board::index))
        .route("/ui/announcements", get(board::load_more))
        .merge(write_routes)
        .route_layer(from_fn_with_state(state.clone(), guard::require_captain));

    Router::new()
        .merge(board_routes)
        .route("/_health/db", get(db_health))
        .route("/static/{*path}", get(assets::serve_static))
        .fallback(not_found)
        .with_state(state)
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
}

async fn not_found(State(state): State<BoardState>) -> Response {
    render_not_found_response(&state.title)
}

async fn db_health(State(state): State<BoardState>) -> Response {
    let Some(db) = state.db.as_ref() else {
        let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
        ErrorReport::from_message(
            "infra::http::db_health",
            StatusCode::SERVICE_UNAVAILABLE,
            "no database configured",
        )
        .attach(&mut response);
        return response;
    };

    match db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
