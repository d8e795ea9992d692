//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use gated_server::http::endpoint::IT_WORKS;
use gated_server::http::{AppState, Endpoint, HttpServer, ServerHandle};
use tokio::net::TcpListener;

/// Start a server on an ephemeral loopback port.
pub async fn start_server(state: AppState) -> (SocketAddr, ServerHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = HttpServer::from_listener(listener, state);
    let addr = server.local_addr().unwrap();
    (addr, server.start())
}

/// Client without pooling or proxies, so every request opens its own connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub async fn get(addr: SocketAddr) -> reqwest::Result<(StatusCode, String)> {
    let res = client().get(format!("http://{addr}/")).send().await?;
    let status = StatusCode::from_u16(res.status().as_u16()).unwrap();
    Ok((status, res.text().await?))
}

/// Poll `cond` until it holds or `within` elapses.
pub async fn eventually(within: Duration, mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(within, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// "It Works!" after a fixed delay.
pub struct SlowEndpoint(pub Duration);

impl Endpoint for SlowEndpoint {
    fn respond(&self) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            tokio::time::sleep(self.0).await;
            (StatusCode::OK, IT_WORKS).into_response()
        })
    }
}

async fn explode(message: &'static str) -> Response {
    panic!("{message}");
}

/// Panics on every request.
pub struct FaultyEndpoint;

impl Endpoint for FaultyEndpoint {
    fn respond(&self) -> BoxFuture<'_, Response> {
        Box::pin(explode("handler bug"))
    }
}

/// Panics on the first request only.
#[derive(Default)]
pub struct FaultsOnce {
    faulted: AtomicBool,
}

impl Endpoint for FaultsOnce {
    fn respond(&self) -> BoxFuture<'_, Response> {
        if self.faulted.swap(true, Ordering::SeqCst) {
            Box::pin(async { (StatusCode::OK, IT_WORKS).into_response() })
        } else {
            Box::pin(explode("first request bug"))
        }
    }
}
