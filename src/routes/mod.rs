//! Route modules for Inkmark Server

pub mod health;
pub mod pages;
pub mod render;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let service = state.service().clone();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))
        .nest("/api/v1/pages", pages::router(service.store().clone()))
        .nest("/api/v1", render::router(service))
        .with_state(state)
}
