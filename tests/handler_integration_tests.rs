mod common;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lexicon_api::{
    extract::JsonBody,
    handlers,
    models::{
        Collection, CollectionPatch, CollectionResponse, CreateCollectionRequest,
        CreateWordRequest, ErrorResponse, MessageResponse, RegisterUserRequest, Role,
        UserProfile, UserResponse, Word, WordResponse,
    },
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

// --- Helpers ---

async fn read_json<T: DeserializeOwned>(response: Response) -> (StatusCode, T) {
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    (parts.status, serde_json::from_slice(&bytes).unwrap())
}

// --- HANDLER TESTS ---

#[tokio::test]
async fn test_welcome_banner() {
    let Json(banner) = handlers::welcome().await;
    assert_eq!(banner.message, "Welcome to the language learning API!");
}

#[tokio::test]
async fn test_register_user_returns_201_without_password() {
    let (state, _repo) = common::create_test_state();

    let response = handlers::register_user(
        State(state),
        JsonBody(RegisterUserRequest {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "secret1".to_string(),
        }),
    )
    .await
    .into_response();

    let (status, body): (_, serde_json::Value) = read_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let parsed: UserResponse = serde_json::from_value(body).unwrap();
    assert_eq!(parsed.user.username, "ana");
}

#[tokio::test]
async fn test_list_users_excludes_password_hashes() {
    let (state, repo) = common::create_test_state();
    common::seed_user(&repo, "ana", Role::User).await;
    common::seed_user(&repo, "ben", Role::Admin).await;

    let response = handlers::list_users(State(state)).await.into_response();
    let (status, body): (_, serde_json::Value) = read_json(response).await;

    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("password_hash").is_none());
    }
    let parsed: Vec<UserProfile> = serde_json::from_value(body).unwrap();
    assert_eq!(parsed[1].role, Role::Admin);
}

#[tokio::test]
async fn test_create_collection_returns_201_with_owner() {
    let (state, repo) = common::create_test_state();
    let ana = common::seed_user(&repo, "ana", Role::User).await;

    let response = handlers::create_collection(
        ana,
        State(state),
        JsonBody(CreateCollectionRequest {
            name: "Spanish".to_string(),
            description: "Basic Spanish words".to_string(),
        }),
    )
    .await
    .into_response();

    let (status, body): (_, CollectionResponse) = read_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.message, "Collection created successfully");
    assert_eq!(body.collection.user_id, ana.id);
}

#[tokio::test]
async fn test_get_collection_not_found() {
    let (state, _repo) = common::create_test_state();

    let response = handlers::get_collection(State(state), Path(Uuid::new_v4().to_string()))
        .await
        .into_response();

    let (status, body): (_, ErrorResponse) = read_json(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.error, "Collection not found");
}

#[tokio::test]
async fn test_get_collection_invalid_id() {
    let (state, _repo) = common::create_test_state();

    let response = handlers::get_collection(State(state), Path("not-a-uuid".to_string()))
        .await
        .into_response();

    let (status, body): (_, ErrorResponse) = read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "Invalid collection ID");
}

#[tokio::test]
async fn test_update_collection_forbidden_for_non_owner() {
    let (state, repo) = common::create_test_state();
    let ana = common::seed_user(&repo, "ana", Role::User).await;
    let ben = common::seed_user(&repo, "ben", Role::User).await;
    let collection = common::seed_collection(&repo, &ana, "Basics").await;

    let response = handlers::update_collection(
        ben,
        State(state),
        Path(collection.id.to_string()),
        JsonBody(CollectionPatch {
            name: Some("Stolen".to_string()),
            ..Default::default()
        }),
    )
    .await
    .into_response();

    let (status, body): (_, ErrorResponse) = read_json(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.error, "You are not authorized to update this collection");
}

#[tokio::test]
async fn test_update_collection_returns_merged_entity() {
    let (state, repo) = common::create_test_state();
    let ana = common::seed_user(&repo, "ana", Role::User).await;
    let collection = common::seed_collection(&repo, &ana, "Basics").await;

    let response = handlers::update_collection(
        ana,
        State(state),
        Path(collection.id.to_string()),
        JsonBody(CollectionPatch {
            description: Some("Greetings and farewells".to_string()),
            ..Default::default()
        }),
    )
    .await
    .into_response();

    let (status, body): (_, CollectionResponse) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message, "Collection updated successfully");
    assert_eq!(
        body.collection,
        Collection {
            description: "Greetings and farewells".to_string(),
            ..collection
        }
    );
}

#[tokio::test]
async fn test_update_collection_without_fields() {
    let (state, repo) = common::create_test_state();
    let ana = common::seed_user(&repo, "ana", Role::User).await;
    let collection = common::seed_collection(&repo, &ana, "Basics").await;

    let response = handlers::update_collection(
        ana,
        State(state),
        Path(collection.id.to_string()),
        JsonBody(CollectionPatch::default()),
    )
    .await
    .into_response();

    let (status, body): (_, ErrorResponse) = read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "No fields to update");
}

#[tokio::test]
async fn test_word_lifecycle_through_handlers() {
    let (state, repo) = common::create_test_state();
    let ana = common::seed_user(&repo, "ana", Role::User).await;
    let collection = common::seed_collection(&repo, &ana, "Basics").await;

    let response = handlers::create_word(
        ana,
        State(state.clone()),
        Path(collection.id.to_string()),
        JsonBody(CreateWordRequest {
            word: "gato".to_string(),
            translation: "cat".to_string(),
            difficulty: 1,
        }),
    )
    .await
    .into_response();
    let (status, created): (_, WordResponse) = read_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.message, "Word created successfully");

    let response = handlers::list_words(State(state.clone()), Path(collection.id.to_string()))
        .await
        .into_response();
    let (_, words): (_, Vec<Word>) = read_json(response).await;
    assert_eq!(words, vec![created.word.clone()]);

    let response = handlers::get_word(State(state.clone()), Path(created.word.id.to_string()))
        .await
        .into_response();
    let (status, fetched): (_, Word) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created.word);

    let response = handlers::delete_word(ana, State(state), Path(created.word.id.to_string()))
        .await
        .into_response();
    let (status, body): (_, MessageResponse) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message, "Word deleted successfully");
}

#[tokio::test]
async fn test_store_failure_is_reported_generically() {
    let state = common::create_failing_state();

    let response = handlers::list_collections(State(state))
        .await
        .into_response();

    let (status, body): (_, ErrorResponse) = read_json(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.error, "Internal server error");
}
