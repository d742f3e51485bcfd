use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no token. Reads return data of every user, and password
/// hashes are never part of any response.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        .route("/", get(handlers::welcome))
        // GET /health
        // Liveness probe for load balancers and orchestration.
        .route("/health", get(handlers::health))
        // --- Accounts ---
        // GET /users, POST /users (registration)
        .route(
            "/users",
            get(handlers::list_users).post(handlers::register_user),
        )
        .route("/users/{id}", get(handlers::get_user))
        // POST /login
        // Exchanges credentials for a 72-hour bearer token.
        .route("/login", post(handlers::login))
        // --- Vocabulary ---
        .route("/collections", get(handlers::list_collections))
        .route("/collections/{id}", get(handlers::get_collection))
        .route("/collections/{id}/words", get(handlers::list_words))
        .route("/words/{id}", get(handlers::get_word))
}
