//! HTTP server setup and shutdown.
//!
//! # Responsibilities
//! - Create the Axum Router with the "/" handler
//! - Wire up middleware (request ID, tracing, in-flight tracking)
//! - Run the accept loop on a bound listener
//! - Drain on command within a deadline
//!
//! The server never changes state on its own; the lifecycle controller
//! decides when `shutdown` is called.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::any, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ListenerConfig;
use crate::http::endpoint::{Endpoint, ErrorPage, ItWorks, PlainErrorPage};
use crate::http::handler::handle;
use crate::lifecycle::shutdown::{GracefulShutdown, Shutdown, ShutdownOutcome};
use crate::lifecycle::ReadinessGate;
use crate::net::connection::{track_in_flight, InFlightTracker};
use crate::net::listener::{self, ListenerError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: ReadinessGate,
    pub endpoint: Arc<dyn Endpoint>,
    pub error_page: Arc<dyn ErrorPage>,
}

impl AppState {
    /// State serving the default "It Works!" page behind `gate`.
    pub fn new(gate: ReadinessGate) -> Self {
        Self {
            gate,
            endpoint: Arc::new(ItWorks),
            error_page: Arc::new(PlainErrorPage),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Endpoint) -> Self {
        self.endpoint = Arc::new(endpoint);
        self
    }

    pub fn with_error_page(mut self, error_page: impl ErrorPage) -> Self {
        self.error_page = Arc::new(error_page);
        self
    }
}

/// A bound, not yet serving, HTTP server.
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
    in_flight: InFlightTracker,
}

impl HttpServer {
    /// Bind the configured address. Failure here is fatal to the process.
    pub async fn bind(config: &ListenerConfig, state: AppState) -> Result<Self, ListenerError> {
        let listener = listener::bind(config).await?;
        Ok(Self::from_listener(listener, state))
    }

    /// Serve on an already bound listener.
    pub fn from_listener(listener: TcpListener, state: AppState) -> Self {
        let in_flight = InFlightTracker::new();
        let router = Self::build_router(state, in_flight.clone());
        Self {
            listener,
            router,
            in_flight,
        }
    }

    fn build_router(state: AppState, in_flight: InFlightTracker) -> Router {
        Router::new()
            .route("/", any(handle))
            .with_state(state)
            .layer(middleware::from_fn_with_state(in_flight, track_in_flight))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawn the accept loop and return the handle used to stop it.
    pub fn start(self) -> ServerHandle {
        let Self {
            listener,
            router,
            in_flight,
        } = self;
        let shutdown = Shutdown::new();
        let mut stop = shutdown.subscribe();
        let local_addr = listener.local_addr().ok();

        let task = tokio::spawn(async move {
            tracing::info!(address = ?local_addr, "HTTP server starting");
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await;
            match &result {
                Ok(()) => tracing::info!("HTTP server stopped"),
                Err(e) => tracing::error!(error = %e, "HTTP server failed"),
            }
            result
        });

        ServerHandle {
            shutdown,
            task,
            in_flight,
        }
    }
}

/// Running server.
pub struct ServerHandle {
    shutdown: Shutdown,
    task: JoinHandle<std::io::Result<()>>,
    in_flight: InFlightTracker,
}

impl ServerHandle {
    /// Requests currently being handled.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.active_count()
    }
}

impl GracefulShutdown for ServerHandle {
    /// Stop accepting, let open connections finish their current request
    /// without keep-alive, and wait up to `deadline` for them.
    ///
    /// Requests still running at the deadline are abandoned: the serving task
    /// is detached, not aborted.
    async fn shutdown(self, deadline: Duration) -> ShutdownOutcome {
        tracing::info!(in_flight = self.in_flight(), "HTTP server shutting down");
        self.shutdown.trigger();

        match tokio::time::timeout(deadline, self.task).await {
            Ok(Ok(Ok(()))) => ShutdownOutcome::clean(),
            Ok(Ok(Err(_))) => ShutdownOutcome::failed(),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "HTTP server task did not finish");
                ShutdownOutcome::failed()
            }
            Err(_) => ShutdownOutcome::timed_out(self.in_flight.active_count()),
        }
    }
}
