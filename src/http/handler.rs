//! Request handler for "/".
//!
//! # Responsibilities
//! - Wait on the readiness gate before producing a response
//! - Mark normal responses non-persistent (`Connection: close`)
//! - Turn any panic during generation into the error page
//! - Swallow a panic raised by the error page itself
//!
//! The gate wait is inside the fault boundary and has no timeout; only a
//! drain deadline bounds it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;

use crate::http::endpoint::HandlerFault;
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn handle(State(state): State<AppState>) -> Response {
    let start = Instant::now();

    let response = match AssertUnwindSafe(generate(&state)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => recover(&state, payload),
    };

    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn generate(state: &AppState) -> Response {
    state.gate.await_ready().await;

    let mut response = state.endpoint.respond().await;
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

fn recover(state: &AppState, payload: Box<dyn Any + Send>) -> Response {
    let fault = HandlerFault::from_panic(payload.as_ref());
    metrics::record_fault();
    tracing::error!(fault = %fault, "Request handler panicked");

    panic::catch_unwind(AssertUnwindSafe(|| state.error_page.render(&fault)))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
