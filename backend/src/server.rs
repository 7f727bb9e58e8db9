use std::{net::SocketAddr, sync::Arc, time::Duration};

use aide::openapi::OpenApi;
use axum::{extract::DefaultBodyLimit, Extension, Router};
use flashcards_storage::image::ImageStore;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::routes;
use crate::{
    images::MAX_IMAGE_BYTES, jwt::JwtManager, media_storage::ObjectStore, types::Environment,
};

const DEFAULT_PORT: u16 = 8000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Builds the application router with every dependency attached
pub fn app(
    environment: Environment,
    image_store: Arc<dyn ImageStore>,
    media_storage: Arc<dyn ObjectStore>,
    jwt_manager: Arc<JwtManager>,
) -> Router {
    let mut openapi = OpenApi::default();

    routes::handler()
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(image_store))
        .layer(Extension(media_storage))
        .layer(Extension(jwt_manager))
        .layer(DefaultBodyLimit::max(
            MAX_IMAGE_BYTES + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    image_store: Arc<dyn ImageStore>,
    media_storage: Arc<dyn ObjectStore>,
    jwt_manager: Arc<JwtManager>,
) -> anyhow::Result<()> {
    let router = app(environment, image_store, media_storage, jwt_manager);

    let addr = SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(DEFAULT_PORT), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Flashcards Backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
