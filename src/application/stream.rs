//! Helpers for building server-driven datastar SSE responses.

use std::convert::Infallible;

use async_stream::stream;
use axum::response::{
    IntoResponse, Response,
    sse::{Event, Sse},
};
use datastar::prelude::{ElementPatchMode, ExecuteScript, PatchElements, PatchSignals};

/// Builder for composing datastar-compatible SSE responses.
pub struct StreamBuilder {
    events: Vec<Event>,
}

impl StreamBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an element patch targeting the supplied selector.
    pub fn push_patch(
        &mut self,
        html: String,
        selector: &str,
        mode: ElementPatchMode,
    ) -> &mut Self {
        let event = PatchElements::new(html)
            .selector(selector)
            .mode(mode)
            .write_as_axum_sse_event();
        self.events.push(event);
        self
    }

    /// Remove every element matching the selector.
    pub fn push_remove(&mut self, selector: &str) -> &mut Self {
        self.push_patch(String::new(), selector, ElementPatchMode::Remove)
    }

    /// Queue an inline script for execution on the client.
    pub fn push_script(&mut self, script: String) -> &mut Self {
        let event = ExecuteScript::new(script).write_as_axum_sse_event();
        self.events.push(event);
        self
    }

    /// Queue a datastar signal patch.
    pub fn push_signals(&mut self, payload: &str) -> &mut Self {
        let event = PatchSignals::new(payload).write_as_axum_sse_event();
        self.events.push(event);
        self
    }

    /// Finalise the builder into an Axum response.
    pub fn into_response(self) -> Response {
        let stream = stream! {
            for event in self.events {
                yield Ok::<Event, Infallible>(event);
            }
        };
        Sse::new(stream).into_response()
    }
}

impl Default for StreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::CONTENT_TYPE;

    use super::*;

    #[tokio::test]
    async fn queued_events_are_streamed_in_order() {
        let mut builder = StreamBuilder::new();
        builder
            .push_patch("<li></li>".into(), "#announcement-list", ElementPatchMode::Prepend)
            .push_remove("#announcement-1")
            .push_signals(r#"{"editing":false}"#);

        let body = axum::body::to_bytes(builder.into_response().into_body(), usize::MAX)
            .await
            .expect("body");
        let body = String::from_utf8_lossy(&body);

        let prepend = body.find("#announcement-list").expect("prepend patch");
        let remove = body.find("#announcement-1").expect("remove patch");
        let signals = body.find("datastar-patch-signals").expect("signal patch");
        assert!(prepend < remove && remove < signals);
    }

    #[test]
    fn response_is_an_event_stream() {
        let mut builder = StreamBuilder::new();
        builder.push_script("void 0".into());
        let response = builder.into_response();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("text/event-stream"));
    }
}
