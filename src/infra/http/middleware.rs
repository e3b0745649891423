use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

use super::DATASTAR_REQUEST_HEADER;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_FORWARDED_ID_LEN: usize = 64;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    /// Reuse the id set by the proxy in front of the board, or mint one.
    fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_FORWARDED_ID_LEN
                    && id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            });

        Self {
            request_id: forwarded
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::from_headers(request.headers());
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// What `log_responses` knows about a request once its response failed.
struct FailedRequest {
    method: Method,
    uri: Uri,
    sse: bool,
    request_id: String,
    elapsed_ms: u128,
    source: &'static str,
    chain: Vec<String>,
}

impl FailedRequest {
    fn detail(&self) -> &str {
        self.chain
            .first()
            .map(String::as_str)
            .unwrap_or("no diagnostic available")
    }

    fn log(&self, status: StatusCode) {
        if status.is_server_error() {
            error!(
                target = "noticeboard::http::response",
                status = status.as_u16(),
                method = %self.method,
                path = %self.uri.path(),
                query = self.uri.query().unwrap_or(""),
                sse = self.sse,
                elapsed_ms = self.elapsed_ms,
                source = self.source,
                detail = %self.detail(),
                chain = ?self.chain,
                request_id = %self.request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "noticeboard::http::response",
                status = status.as_u16(),
                method = %self.method,
                path = %self.uri.path(),
                sse = self.sse,
                source = self.source,
                detail = %self.detail(),
                request_id = %self.request_id,
                "client request error",
            );
        }
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let sse = request.headers().contains_key(DATASTAR_REQUEST_HEADER);
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (source, chain) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };

    FailedRequest {
        method,
        uri,
        sse,
        request_id,
        elapsed_ms: start.elapsed().as_millis(),
        source,
        chain,
    }
    .log(status);

    response
}
