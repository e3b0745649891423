//! Identity resolution and captain-only route protection.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header::LOCATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::application::guard::{Access, Identity};
use crate::application::stream::StreamBuilder;

use super::{BoardState, DATASTAR_REQUEST_HEADER};

/// Only the captain may see the board. Anonymous visitors and other
/// signed-in crew are sent to the entry page; the captain's identity is
/// handed to the handlers.
pub(crate) async fn require_captain(
    State(state): State<BoardState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let identity = request
        .headers()
        .get(&state.auth.identity_header)
        .and_then(|value| value.to_str().ok())
        .and_then(Identity::from_header_value);

    match state.guard.resolve(identity).await {
        Access::Captain(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Access::Member(_) => {
            debug!(
                target = "noticeboard::http::guard",
                path = %request.uri().path(),
                "not the captain; redirecting to entry page"
            );
            redirect_to_entry(request.headers(), &state.auth.entry_url)
        }
        Access::Anonymous => {
            debug!(
                target = "noticeboard::http::guard",
                path = %request.uri().path(),
                "no identity; redirecting to entry page"
            );
            redirect_to_entry(request.headers(), &state.auth.entry_url)
        }
    }
}

fn redirect_to_entry(headers: &HeaderMap, entry_url: &str) -> Response {
    if headers.contains_key(DATASTAR_REQUEST_HEADER) {
        // SSE requests cannot follow a redirect; navigate the page instead.
        let target = serde_json::to_string(entry_url).unwrap_or_else(|_| "\"/\"".to_string());
        let mut stream = StreamBuilder::new();
        stream.push_script(format!("window.location.assign({target})"));
        return stream.into_response();
    }

    (StatusCode::SEE_OTHER, [(LOCATION, entry_url.to_string())]).into_response()
}
