//! Response generation seams.
//!
//! [`Endpoint`] produces the normal response for "/"; [`ErrorPage`] produces
//! the response sent after the endpoint faulted. Both are swappable so an
//! embedder can plug in real content, and tests can plug in faults.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;

pub const IT_WORKS: &str = "It Works!";
pub const ERROR_OCCURRED: &str = "Error occurred";

/// Normal-path response generation.
pub trait Endpoint: Send + Sync + 'static {
    fn respond(&self) -> BoxFuture<'_, Response>;
}

/// Fault-path response generation.
pub trait ErrorPage: Send + Sync + 'static {
    fn render(&self, fault: &HandlerFault) -> Response;
}

/// A fault caught at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFault {
    pub message: String,
}

impl HandlerFault {
    /// Extract a message from a panic payload.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}

impl std::fmt::Display for HandlerFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// The example endpoint: 200 "It Works!".
#[derive(Debug, Clone, Copy, Default)]
pub struct ItWorks;

impl Endpoint for ItWorks {
    fn respond(&self) -> BoxFuture<'_, Response> {
        Box::pin(async { (StatusCode::OK, IT_WORKS).into_response() })
    }
}

/// Fixed 500 "Error occurred".
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainErrorPage;

impl ErrorPage for PlainErrorPage {
    fn render(&self, _fault: &HandlerFault) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, ERROR_OCCURRED).into_response()
    }
}
