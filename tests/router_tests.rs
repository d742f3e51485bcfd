mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use lexicon_api::{AppState, create_router, models::Role};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use uuid::Uuid;

// --- Helpers ---

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn app() -> (Router, AppState, std::sync::Arc<lexicon_api::InMemoryRepository>) {
    let (state, repo) = common::create_test_state();
    (create_router(state.clone()), state, repo)
}

// --- Tests ---

#[tokio::test]
async fn test_health_and_welcome() {
    let (router, _state, _repo) = app();

    let response = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let (status, body) = send(&router, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the language learning API!");
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let (router, state, repo) = app();
    let ana = common::seed_user(&repo, "ana", Role::User).await;
    let collection = common::seed_collection(&repo, &ana, "Basics").await;
    let collection_uri = format!("/collections/{}", collection.id);
    let words_uri = format!("{collection_uri}/words");
    let user_uri = format!("/users/{}", ana.id);

    let protected = [
        (Method::POST, "/collections".to_string()),
        (Method::PATCH, collection_uri.clone()),
        (Method::DELETE, collection_uri.clone()),
        (Method::POST, words_uri),
        (Method::PATCH, user_uri.clone()),
        (Method::DELETE, user_uri),
        (Method::DELETE, format!("/words/{}", Uuid::new_v4())),
    ];

    for (method, uri) in protected {
        let (status, body) = send(&router, method.clone(), &uri, None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["error"], "Missing or invalid token");
    }

    let (status, body) = send(
        &router,
        Method::DELETE,
        &collection_uri,
        Some("Bearer forged.token.value"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    // The collection survived every rejected request.
    let token = common::bearer(&state, &ana);
    let (status, _) = send(&router, Method::GET, &collection_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_public_reads_need_no_token() {
    let (router, _state, repo) = app();
    let ana = common::seed_user(&repo, "ana", Role::User).await;
    let collection = common::seed_collection(&repo, &ana, "Basics").await;
    let word = common::seed_word(&repo, collection.id, "hola").await;

    for uri in [
        "/collections".to_string(),
        format!("/collections/{}", collection.id),
        format!("/collections/{}/words", collection.id),
        format!("/words/{}", word.id),
        "/users".to_string(),
        format!("/users/{}", ana.id),
    ] {
        let (status, _) = send(&router, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_ownership_scenario() {
    let (router, _state, _repo) = app();

    // Register and log in as ana.
    let (status, body) = send(
        &router,
        Method::POST,
        "/users",
        None,
        Some(json!({"username": "ana", "email": "ana@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["user"].get("password").is_none());
    let ana_id = body["user"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        Method::POST,
        "/login",
        None,
        Some(json!({"email": "ana@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ana_token = format!("Bearer {}", body["token"].as_str().unwrap());

    // Ana creates a collection; the owner is taken from her token.
    let (status, body) = send(
        &router,
        Method::POST,
        "/collections",
        Some(&ana_token),
        Some(json!({"name": "Spanish", "description": "Basic Spanish words", "userId": Uuid::new_v4()})),
    )
    .await;
    // Unknown fields on create bodies are ignored, including an attempted owner.
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["collection"]["userId"], ana_id.as_str());
    let collection_uri = format!("/collections/{}", body["collection"]["id"].as_str().unwrap());

    // Ben may not delete it.
    send(
        &router,
        Method::POST,
        "/users",
        None,
        Some(json!({"username": "ben", "email": "ben@example.com", "password": "secret2"})),
    )
    .await;
    let (_, body) = send(
        &router,
        Method::POST,
        "/login",
        None,
        Some(json!({"email": "ben@example.com", "password": "secret2"})),
    )
    .await;
    let ben_token = format!("Bearer {}", body["token"].as_str().unwrap());

    let (status, _) = send(&router, Method::DELETE, &collection_uri, Some(&ben_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Ana may, and afterwards it is gone.
    let (status, body) =
        send(&router, Method::DELETE, &collection_uri, Some(&ana_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Collection deleted successfully");

    let (status, _) = send(&router, Method::GET, &collection_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let (router, state, repo) = app();
    let ana = common::seed_user(&repo, "ana", Role::User).await;
    let token = common::bearer(&state, &ana);
    let collection = common::seed_collection(&repo, &ana, "Basics").await;
    let uri = format!("/collections/{}", collection.id);

    // Explicit null on a non-nullable field.
    let (status, body) = send(&router, Method::PATCH, &uri, Some(&token), Some(json!({"name": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

    // Unknown field on a patch.
    let (status, _) = send(&router, Method::PATCH, &uri, Some(&token), Some(json!({"userId": Uuid::new_v4()}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Empty patch.
    let (status, body) = send(&router, Method::PATCH, &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No fields to update");

    // Out-of-range difficulty.
    let (status, _) = send(
        &router,
        Method::POST,
        &format!("{uri}/words"),
        Some(&token),
        Some(json!({"word": "hola", "translation": "hello", "difficulty": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Invalid identifier in the path.
    let (status, body) = send(&router, Method::GET, "/words/42", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid word ID");
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let (router, _state, _repo) = app();
    let payload = json!({"username": "ana", "email": "ana@example.com", "password": "secret1"});

    let (status, _) = send(&router, Method::POST, "/users", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&router, Method::POST, "/users", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A user with this email already exists");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (router, _state, _repo) = app();

    let (status, body) = send(&router, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/collections/{id}/words").is_some());
    assert!(body["components"]["securitySchemes"].get("bearer").is_some());
}
