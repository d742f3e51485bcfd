use crate::models::{Collection, User, Word};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, postgres::PgRow, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Message reported when the unique email constraint rejects a write.
pub const DUPLICATE_EMAIL: &str = "A user with this email already exists";

/// StoreError
///
/// Persistence failures. Only `Conflict` is meaningful to clients; every other
/// variant is reported as a generic server error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    /// A foreign key points at a row that no longer exists, e.g. a collection
    /// deleted between an ownership check and the insert that depended on it.
    #[error("missing referenced row: {0}")]
    MissingReference(String),

    #[error("field `{0}` cannot be updated")]
    UnknownField(&'static str),

    #[error("update requires at least one field")]
    EmptyUpdate,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return match db_err.constraint() {
                    Some("users_email_key") => StoreError::Conflict(DUPLICATE_EMAIL.to_string()),
                    _ => StoreError::Conflict("Resource already exists".to_string()),
                };
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingReference(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

// --- Sparse Updates ---

/// A single column value inside a `FieldSet`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i32),
    Id(Uuid),
}

/// FieldSet
///
/// Sparse mapping from column name to new value, the unit of every partial
/// update. Columns that are absent are left untouched by the store. Column names
/// come from service code, never from clients, and each store checks them
/// against its own allow-list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<(&'static str, FieldValue)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column`, replacing any earlier value for it.
    pub fn set(&mut self, column: &'static str, value: FieldValue) -> &mut Self {
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }
}

/// Repository Trait
///
/// The Credential Store contract: every persistence operation the services need.
/// Handlers never see it directly; they go through the entity services, which
/// apply validation and authorization first.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, user: User) -> Result<User, StoreError>;
    async fn update_user(&self, id: Uuid, fields: &FieldSet) -> Result<Option<User>, StoreError>;
    // Removes the user together with their collections and words.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    // --- Collections ---
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError>;
    async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>, StoreError>;
    async fn create_collection(&self, collection: Collection) -> Result<Collection, StoreError>;
    async fn update_collection(
        &self,
        id: Uuid,
        fields: &FieldSet,
    ) -> Result<Option<Collection>, StoreError>;
    // Removes the collection together with its words.
    async fn delete_collection(&self, id: Uuid) -> Result<bool, StoreError>;

    // --- Words ---
    async fn list_words(&self, collection_id: Uuid) -> Result<Vec<Word>, StoreError>;
    async fn get_word(&self, id: Uuid) -> Result<Option<Word>, StoreError>;
    // Fails with `MissingReference` if the collection does not exist.
    async fn create_word(&self, word: Word) -> Result<Word, StoreError>;
    async fn update_word(&self, id: Uuid, fields: &FieldSet) -> Result<Option<Word>, StoreError>;
    async fn delete_word(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Column layout and update allow-list of one table.
struct Table {
    name: &'static str,
    columns: &'static str,
    updatable: &'static [&'static str],
}

const USERS: Table = Table {
    name: "users",
    columns: "id, username, email, password_hash, role",
    updatable: &["username", "email", "password_hash"],
};

const COLLECTIONS: Table = Table {
    name: "collections",
    columns: "id, name, description, user_id",
    updatable: &["name", "description"],
};

const WORDS: Table = Table {
    name: "words",
    columns: "id, collection_id, word, translation, difficulty",
    updatable: &["collection_id", "word", "translation", "difficulty"],
};

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// update_fields
    ///
    /// Builds `UPDATE <table> SET col = $n, ... WHERE id = $m RETURNING ...` from a
    /// `FieldSet` using `QueryBuilder`, so every value is a bound parameter.
    async fn update_fields<T>(
        &self,
        table: &Table,
        id: Uuid,
        fields: &FieldSet,
    ) -> Result<Option<T>, StoreError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        if fields.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("UPDATE {} SET ", table.name));
        {
            let mut assignments = builder.separated(", ");
            for (column, value) in fields.iter() {
                if !table.updatable.contains(&column) {
                    return Err(StoreError::UnknownField(column));
                }
                assignments.push(format!("{column} = "));
                match value {
                    FieldValue::Text(text) => assignments.push_bind_unseparated(text.clone()),
                    FieldValue::Integer(number) => assignments.push_bind_unseparated(*number),
                    FieldValue::Id(uuid) => assignments.push_bind_unseparated(*uuid),
                };
            }
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {}", table.columns));

        let row = builder
            .build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, table: &Table, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table.name))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at, id",
            USERS.columns
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USERS.columns
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USERS.columns
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// Inserts the account row. A duplicate email trips `users_email_key` and
    /// comes back as `StoreError::Conflict`.
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USERS.columns
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_user(&self, id: Uuid, fields: &FieldSet) -> Result<Option<User>, StoreError> {
        self.update_fields(&USERS, id, fields).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id(&USERS, id).await
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        let collections = sqlx::query_as::<_, Collection>(&format!(
            "SELECT {} FROM collections ORDER BY created_at, id",
            COLLECTIONS.columns
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(collections)
    }

    async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>, StoreError> {
        let collection = sqlx::query_as::<_, Collection>(&format!(
            "SELECT {} FROM collections WHERE id = $1",
            COLLECTIONS.columns
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(collection)
    }

    async fn create_collection(&self, collection: Collection) -> Result<Collection, StoreError> {
        let created = sqlx::query_as::<_, Collection>(&format!(
            "INSERT INTO collections (id, name, description, user_id) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            COLLECTIONS.columns
        ))
        .bind(collection.id)
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(collection.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_collection(
        &self,
        id: Uuid,
        fields: &FieldSet,
    ) -> Result<Option<Collection>, StoreError> {
        self.update_fields(&COLLECTIONS, id, fields).await
    }

    async fn delete_collection(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id(&COLLECTIONS, id).await
    }

    async fn list_words(&self, collection_id: Uuid) -> Result<Vec<Word>, StoreError> {
        let words = sqlx::query_as::<_, Word>(&format!(
            "SELECT {} FROM words WHERE collection_id = $1 ORDER BY created_at, id",
            WORDS.columns
        ))
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(words)
    }

    async fn get_word(&self, id: Uuid) -> Result<Option<Word>, StoreError> {
        let word = sqlx::query_as::<_, Word>(&format!(
            "SELECT {} FROM words WHERE id = $1",
            WORDS.columns
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(word)
    }

    /// create_word
    ///
    /// The foreign key on `collection_id` is the only guard against a collection
    /// deleted after the caller's ownership check; the violation is reported as
    /// `StoreError::MissingReference`.
    async fn create_word(&self, word: Word) -> Result<Word, StoreError> {
        let created = sqlx::query_as::<_, Word>(&format!(
            "INSERT INTO words (id, collection_id, word, translation, difficulty) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            WORDS.columns
        ))
        .bind(word.id)
        .bind(word.collection_id)
        .bind(&word.word)
        .bind(&word.translation)
        .bind(word.difficulty)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_word(&self, id: Uuid, fields: &FieldSet) -> Result<Option<Word>, StoreError> {
        self.update_fields(&WORDS, id, fields).await
    }

    async fn delete_word(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id(&WORDS, id).await
    }
}
