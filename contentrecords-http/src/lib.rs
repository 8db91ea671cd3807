//! HTTP host for content records pages.
//!
//! Every path serves the same [`Page`]. A request is buffered into a
//! [`HostRequest`](contentrecords_engine::HostRequest), the page's instances
//! are rendered on the blocking pool, and the outcome becomes the response:
//! the page as JSON, an inline-edit answer, or a `303` redirect.

mod error;
mod page;
mod request;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tracing::error;

pub use error::{HostError, HostResult};
pub use page::{HostState, Page, PageOutcome, PageResponse};
pub use request::buffer_request;

async fn page_handler(State(state): State<Arc<HostState>>, request: Request) -> Response {
    let host_request = match buffer_request(request).await {
        Ok(host_request) => host_request,
        Err(e) => return e.into_response(),
    };
    match tokio::task::spawn_blocking(move || state.render(&host_request)).await {
        Ok(outcome) => outcome.into_response(),
        Err(e) => {
            error!(error = %e, "render task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Build the HTTP router serving the page held by `state`.
pub fn build_router(state: Arc<HostState>) -> Router {
    Router::new()
        .fallback(page_handler)
        .layer(DefaultBodyLimit::max(state.body_limit()))
        .with_state(state)
}
