pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth_handlers;
use crate::conversions::handlers as conversion_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth (delegated to the remote identity provider)
        .route("/api/v1/auth/signup", post(auth_handlers::handle_signup))
        .route("/api/v1/auth/login", post(auth_handlers::handle_login))
        .route("/api/v1/auth/logout", post(auth_handlers::handle_logout))
        // Conversions
        .route(
            "/api/v1/conversions",
            post(conversion_handlers::handle_convert).get(conversion_handlers::handle_history),
        )
        .with_state(state)
}
