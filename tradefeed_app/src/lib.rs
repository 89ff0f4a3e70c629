pub mod app;
pub mod config;
pub mod routes;

#[cfg(test)]
mod test_util;

use tradefeed_domain::error::FeedError;

use anyhow::Context;
use axum::error_handling::HandleErrorLayer;
use axum::BoxError;
use entrait::Impl;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

pub async fn serve(
    app: app::App,
    listen_addr: SocketAddr,
    request_timeout: Duration,
) -> anyhow::Result<()> {
    let router = with_request_timeout(routes::api_router::<Impl<app::App>>(), request_timeout)
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::Extension(Impl::new(app)))
                // Enables logging. Use `RUST_LOG=tower_http=debug`
                .layer(tower_http::trace::TraceLayer::new_for_http()),
        );

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("could not bind {listen_addr}"))?;

    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("error running HTTP server")
}

/// Answer requests that outlive `timeout` with a transient error.
pub fn with_request_timeout(router: axum::Router, timeout: Duration) -> axum::Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(timeout_error))
            .timeout(timeout),
    )
}

async fn timeout_error(error: BoxError) -> FeedError {
    if error.is::<tower::timeout::error::Elapsed>() {
        FeedError::Unavailable(anyhow::anyhow!("request timed out"))
    } else {
        FeedError::Anyhow(anyhow::anyhow!("unhandled middleware error: {error}"))
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal, shutting down");
}
