use crate::{
    handlers, // Import handlers module
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Form bodies are two short text fields; anything bigger is rejected early.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Creates the Axum router and associates routes with handlers.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_memes))
        .route("/memes", post(handlers::create_meme))
        .route("/memes/{id}/edit", get(handlers::edit_meme))
        .route(
            "/memes/{id}",
            put(handlers::update_meme)
                .delete(handlers::delete_meme)
                .post(handlers::override_meme),
        )
        .fallback(handlers::not_found)
        // Middleware Layers
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .with_state(state) // Pass the application state
}
