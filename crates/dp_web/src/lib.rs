use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/feed", get(handlers::feed))
        .route("/summary", get(handlers::summary))
        .route("/conversation", get(handlers::conversation))
        .route("/podcast", get(handlers::podcast))
        .route("/update-cache", post(handlers::update_cache))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
