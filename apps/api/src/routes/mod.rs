pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::resume::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resume/normalize", post(handlers::handle_normalize))
        .route("/api/v1/resume/model", post(handlers::handle_model))
        .route("/api/v1/resume/render", post(handlers::handle_render))
        .with_state(state)
}
