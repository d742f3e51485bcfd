#![allow(dead_code)]

use lexicon_api::{
    AppConfig, AppState, InMemoryRepository,
    auth::AuthUser,
    models::{Collection, Role, User, Word},
    repository::RepositoryState,
};
use std::sync::Arc;
use uuid::Uuid;

/// Builds an `AppState` over a fresh in-memory store. The store is returned too so
/// tests can seed rows and count writes.
pub fn create_test_state() -> (AppState, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    let state = AppState::new(repo.clone() as RepositoryState, AppConfig::default())
        .expect("default config has a usable secret");
    (state, repo)
}

pub fn create_failing_state() -> AppState {
    let repo = Arc::new(InMemoryRepository::new_failing()) as RepositoryState;
    AppState::new(repo, AppConfig::default()).expect("default config has a usable secret")
}

/// Inserts a user directly, bypassing registration. The password hash is not a
/// valid PHC string, so seeded users cannot log in.
pub async fn seed_user(repo: &InMemoryRepository, name: &str, role: Role) -> AuthUser {
    let id = Uuid::new_v4();
    repo.seed_user(User {
        id,
        username: name.to_string(),
        email: format!("{name}@example.com"),
        password_hash: "seeded".to_string(),
        role,
    })
    .await;
    AuthUser { id, role }
}

pub async fn seed_collection(repo: &InMemoryRepository, owner: &AuthUser, name: &str) -> Collection {
    use lexicon_api::repository::Repository;

    repo.create_collection(Collection {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("{name} vocabulary"),
        user_id: owner.id,
    })
    .await
    .expect("owner exists")
}

pub async fn seed_word(repo: &InMemoryRepository, collection_id: Uuid, word: &str) -> Word {
    let word = Word {
        id: Uuid::new_v4(),
        collection_id,
        word: word.to_string(),
        translation: format!("{word}-translated"),
        difficulty: 2,
    };
    repo.seed_word(word.clone()).await;
    word
}

pub fn bearer(state: &AppState, user: &AuthUser) -> String {
    let token = state.tokens.issue(user.id, user.role).expect("token signs");
    format!("Bearer {token}")
}
