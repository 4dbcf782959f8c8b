use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use throne_core::ProviderGateway;

use super::handlers;

pub fn create_router() -> Router<Arc<ProviderGateway>> {
    Router::new()
        .route("/", get(handlers::health_check))
        .route(
            "/api/chat",
            post(handlers::handle_chat).get(handlers::chat_info),
        )
        .route("/api/models", get(handlers::handle_models))
}
