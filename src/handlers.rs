use crate::{
    AppState,
    auth::AuthUser,
    error::ServiceError,
    extract::JsonBody,
    models::{
        Collection, CollectionPatch, CollectionResponse, CreateCollectionRequest,
        CreateWordRequest, ErrorResponse, LoginRequest, MessageResponse, RegisterUserRequest,
        TokenResponse, UserPatch, UserProfile, UserResponse, Word, WordPatch, WordResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

// Path identifiers are taken as raw strings so that a malformed id is reported by
// the services as "Invalid <entity> ID" rather than by axum's path rejection.

// --- Service Endpoints ---

/// welcome
///
/// [Public Route] Banner returned at the root path.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome banner", body = MessageResponse))
)]
pub async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the language learning API!"))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

// --- Collections ---

/// list_collections
///
/// [Public Route] Every collection, of every user.
#[utoipa::path(
    get,
    path = "/collections",
    responses(
        (status = 200, description = "All collections", body = [Collection]),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<Collection>>, ServiceError> {
    Ok(Json(state.collections.list().await?))
}

#[utoipa::path(
    get,
    path = "/collections/{id}",
    params(("id" = String, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Collection", body = Collection),
        (status = 400, description = "Invalid collection ID", body = ErrorResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Collection>, ServiceError> {
    Ok(Json(state.collections.get(&id).await?))
}

/// create_collection
///
/// [Authenticated Route] Creates a collection owned by the caller. Any owner
/// information in the body is ignored.
#[utoipa::path(
    post,
    path = "/collections",
    request_body = CreateCollectionRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Collection created", body = CollectionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn create_collection(
    caller: AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<CollectionResponse>), ServiceError> {
    let collection = state.collections.create(&caller, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CollectionResponse {
            message: "Collection created successfully".to_string(),
            collection,
        }),
    ))
}

/// update_collection
///
/// [Authenticated Route] Partial update. Owner or admin only; returns the merged
/// collection.
#[utoipa::path(
    patch,
    path = "/collections/{id}",
    params(("id" = String, Path, description = "Collection ID")),
    request_body = CollectionPatch,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Collection updated", body = CollectionResponse),
        (status = 400, description = "Invalid input or no fields to update", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
pub async fn update_collection(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<CollectionPatch>,
) -> Result<Json<CollectionResponse>, ServiceError> {
    let collection = state.collections.update(&caller, &id, patch).await?;
    Ok(Json(CollectionResponse {
        message: "Collection updated successfully".to_string(),
        collection,
    }))
}

/// delete_collection
///
/// [Authenticated Route] Removes the collection and all of its words.
#[utoipa::path(
    delete,
    path = "/collections/{id}",
    params(("id" = String, Path, description = "Collection ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Collection deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
pub async fn delete_collection(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.collections.delete(&caller, &id).await?;
    Ok(Json(MessageResponse::new("Collection deleted successfully")))
}

// --- Users ---

#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "All users, without password hashes", body = [UserProfile]))
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, ServiceError> {
    Ok(Json(state.users.list().await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserProfile),
        (status = 400, description = "Invalid user ID", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ServiceError> {
    Ok(Json(state.users.get(&id).await?))
}

/// register_user
///
/// [Public Route] Creates an account with the `user` role.
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ServiceError> {
    let user = state.users.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

/// update_user
///
/// [Authenticated Route] Self-service profile update; admins may update anyone.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UserPatch,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid input or no fields to update", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not this user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn update_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> Result<Json<UserResponse>, ServiceError> {
    let user = state.users.update(&caller, &id, patch).await?;
    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not this user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.users.delete(&caller, &id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// login
///
/// [Public Route] Exchanges email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    let token = state.users.login(payload).await?;
    Ok(Json(TokenResponse {
        message: "Token generated successfully".to_string(),
        token,
    }))
}

// --- Words ---

#[utoipa::path(
    get,
    path = "/collections/{id}/words",
    params(("id" = String, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Words of the collection", body = [Word]),
        (status = 400, description = "Invalid collection ID", body = ErrorResponse)
    )
)]
pub async fn list_words(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
) -> Result<Json<Vec<Word>>, ServiceError> {
    Ok(Json(state.words.list(&collection_id).await?))
}

#[utoipa::path(
    get,
    path = "/words/{id}",
    params(("id" = String, Path, description = "Word ID")),
    responses(
        (status = 200, description = "Word", body = Word),
        (status = 400, description = "Invalid word ID", body = ErrorResponse),
        (status = 404, description = "Word not found", body = ErrorResponse)
    )
)]
pub async fn get_word(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Word>, ServiceError> {
    Ok(Json(state.words.get(&id).await?))
}

/// create_word
///
/// [Authenticated Route] Adds a word to a collection the caller owns (or any
/// collection, for admins).
#[utoipa::path(
    post,
    path = "/collections/{id}/words",
    params(("id" = String, Path, description = "Collection ID")),
    request_body = CreateWordRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Word created", body = WordResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not the collection owner", body = ErrorResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
pub async fn create_word(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
    JsonBody(payload): JsonBody<CreateWordRequest>,
) -> Result<(StatusCode, Json<WordResponse>), ServiceError> {
    let word = state.words.create(&caller, &collection_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(WordResponse {
            message: "Word created successfully".to_string(),
            word,
        }),
    ))
}

/// update_word
///
/// [Authenticated Route] Partial update. Setting `collectionId` moves the word,
/// which requires rights on both collections.
#[utoipa::path(
    patch,
    path = "/words/{id}",
    params(("id" = String, Path, description = "Word ID")),
    request_body = WordPatch,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Word updated", body = WordResponse),
        (status = 400, description = "Invalid input or no fields to update", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not the collection owner", body = ErrorResponse),
        (status = 404, description = "Word or target collection not found", body = ErrorResponse)
    )
)]
pub async fn update_word(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<WordPatch>,
) -> Result<Json<WordResponse>, ServiceError> {
    let word = state.words.update(&caller, &id, patch).await?;
    Ok(Json(WordResponse {
        message: "Word updated successfully".to_string(),
        word,
    }))
}

#[utoipa::path(
    delete,
    path = "/words/{id}",
    params(("id" = String, Path, description = "Word ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Word deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not the collection owner", body = ErrorResponse),
        (status = 404, description = "Word not found", body = ErrorResponse)
    )
)]
pub async fn delete_word(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.words.delete(&caller, &id).await?;
    Ok(Json(MessageResponse::new("Word deleted successfully")))
}
