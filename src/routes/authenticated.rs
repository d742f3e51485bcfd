use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{patch, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind the auth middleware, which rejects a missing,
/// malformed or expired token with 401 before any handler runs. Handlers then
/// receive the caller as `AuthUser` and the services apply the owner-or-admin
/// rule.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /collections
        // The new collection is owned by the caller.
        .route("/collections", post(handlers::create_collection))
        // PATCH/DELETE /collections/{id}
        // Deleting a collection also removes its words.
        .route(
            "/collections/{id}",
            patch(handlers::update_collection).delete(handlers::delete_collection),
        )
        // POST /collections/{id}/words
        .route("/collections/{id}/words", post(handlers::create_word))
        // PATCH/DELETE /words/{id}
        // Authorized through the owner of the word's collection.
        .route(
            "/words/{id}",
            patch(handlers::update_word).delete(handlers::delete_word),
        )
        // PATCH/DELETE /users/{id}
        // Self-service only, unless the caller is an admin.
        .route(
            "/users/{id}",
            patch(handlers::update_user).delete(handlers::delete_user),
        )
}
