use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod password;
pub mod policy;
pub mod repository;
pub mod services;

// Module for routing segregation (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use auth::TokenService;
pub use config::{AppConfig, ConfigError};
pub use error::ServiceError;
pub use memory::InMemoryRepository;
pub use repository::{PostgresRepository, RepositoryState};
pub use services::{CollectionService, UserService, WordService};

/// ApiDoc
///
/// Auto-generated OpenAPI document for every handler decorated with
/// `#[utoipa::path]`. Served at `/api-docs/openapi.json`, browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::welcome, handlers::health,
        handlers::list_collections, handlers::get_collection, handlers::create_collection,
        handlers::update_collection, handlers::delete_collection,
        handlers::list_users, handlers::get_user, handlers::register_user,
        handlers::update_user, handlers::delete_user, handlers::login,
        handlers::list_words, handlers::get_word, handlers::create_word,
        handlers::update_word, handlers::delete_word
    ),
    components(
        schemas(
            models::Role, models::UserProfile, models::Collection, models::Word,
            models::RegisterUserRequest, models::LoginRequest, models::CreateCollectionRequest,
            models::CreateWordRequest, models::UserPatch, models::CollectionPatch, models::WordPatch,
            models::ErrorResponse, models::MessageResponse, models::UserResponse,
            models::TokenResponse, models::CollectionResponse, models::WordResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "lexicon", description = "Language learning vocabulary API")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Implements the **Unified State Pattern**: one cheaply cloneable container with
/// the store, the token service, the entity services and the configuration,
/// shared by every request.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Postgres in production, in memory in tests.
    pub repo: RepositoryState,
    /// Token Layer: signs and verifies session tokens with the configured secret.
    pub tokens: TokenService,
    pub users: UserService,
    pub collections: CollectionService,
    pub words: WordService,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wires every service onto `repo`. Fails only when the signing secret is
    /// unusable.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Result<Self, ConfigError> {
        let tokens = TokenService::new(&config.jwt_secret)?;

        Ok(Self {
            users: UserService::new(repo.clone(), tokens.clone()),
            collections: CollectionService::new(repo.clone()),
            words: WordService::new(repo.clone()),
            repo,
            tokens,
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors pull single components out of the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the `authenticated_routes`. Extracting `AuthUser` verifies the bearer
/// token; a failure rejects the request with 401 before the handler runs. The
/// verified identity is stored in the request extensions so the handler's own
/// `AuthUser` argument does not decode the token a second time.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: Protected by the `auth_middleware`.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a span
                // carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echoes x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Used by `TraceLayer` to build the per-request span. Includes the `x-request-id`
/// header so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
