mod docs;
mod health;
pub mod images;

use aide::axum::{
    routing::{get, post_with},
    ApiRouter,
};
use axum::middleware;

use crate::middleware::auth_middleware;

/// Creates the router with all handler routes
pub fn handler() -> ApiRouter {
    let public_routes = ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler));

    let protected_routes = ApiRouter::new()
        .api_route("/api/images", get(images::list_images))
        .api_route(
            "/api/images/upload",
            post_with(images::upload_image, images::upload_image_docs),
        )
        .layer(middleware::from_fn(auth_middleware));

    public_routes.merge(protected_routes)
}
