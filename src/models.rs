use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Roles ---

/// Role
///
/// The RBAC field carried by users and session tokens. New accounts are always
/// `User`; `Admin` can only be granted directly in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

// --- Stored Entities ---

/// User
///
/// The full account record as stored in the `users` table. Holds the password
/// hash, so it is never serialized; responses use `UserProfile`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// UserProfile
///
/// Public projection of a user: everything except the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// Collection
///
/// A named set of vocabulary words. `user_id` is the owner, assigned from the
/// authenticated caller at creation and never changed through the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub user_id: Uuid,
}

/// Word
///
/// A vocabulary entry. Carries no owner of its own: ownership is resolved through
/// `collection_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Word {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub word: String,
    pub translation: String,
    pub difficulty: i32,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input for `POST /users`. Any `role` sent by the client is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// LoginRequest
///
/// Input for `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct CreateCollectionRequest {
    #[validate(length(min = 3, max = 50))]
    pub name: String,
    #[validate(length(min = 3, max = 200))]
    pub description: String,
}

/// CreateWordRequest
///
/// Input for `POST /collections/{id}/words`. The collection comes from the path.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct CreateWordRequest {
    #[validate(length(min = 1, max = 50))]
    pub word: String,
    #[validate(length(min = 1, max = 100))]
    pub translation: String,
    #[validate(range(min = 1, max = 5))]
    pub difficulty: i32,
}

// --- Partial Updates ---
//
// Absent fields stay `None`. An explicit `null` fails deserialization because no
// field is nullable, and unknown fields are rejected outright.

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 6))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CollectionPatch {
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 3, max = 50))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 3, max = 200))]
    pub description: Option<String>,
}

/// WordPatch
///
/// `collection_id` is kept as raw text so an unparseable value surfaces as an
/// invalid identifier rather than a generic body error.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct WordPatch {
    #[serde(default, deserialize_with = "present")]
    pub collection_id: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 1, max = 50))]
    pub word: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 1, max = 100))]
    pub translation: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(range(min = 1, max = 5))]
    pub difficulty: Option<i32>,
}

// --- Response Envelopes (Output Schemas) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CollectionResponse {
    pub message: String,
    pub collection: Collection,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct WordResponse {
    pub message: String,
    pub word: Word,
}
