use crate::{
    models::{Collection, User, Word},
    repository::{DUPLICATE_EMAIL, FieldSet, FieldValue, Repository, StoreError},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    collections: Vec<Collection>,
    words: Vec<Word>,
}

/// InMemoryRepository
///
/// A `Repository` held entirely in process memory, used by the test suites and for
/// running the API without Postgres. It enforces the same constraints as the SQL
/// schema: unique emails, word → collection foreign keys, and cascading deletes.
///
/// Rows keep insertion order, matching the `ORDER BY created_at` of the SQL store.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    writes: AtomicUsize,
    /// When true, every operation returns `StoreError::Unavailable`.
    pub should_fail: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Number of successful mutations (inserts, updates, deletes) so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Inserts a user as-is, bypassing constraint checks. Used to provision
    /// admins, which the API never creates.
    pub async fn seed_user(&self, user: User) {
        self.tables.write().await.users.push(user);
    }

    /// Inserts a word as-is, without the collection reference check.
    pub async fn seed_word(&self, word: Word) {
        self.tables.write().await.words.push(word);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.should_fail {
            return Err(StoreError::Unavailable(
                "in-memory store configured to fail".to_string(),
            ));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn apply_user(user: &mut User, fields: &FieldSet) -> Result<(), StoreError> {
    for (column, value) in fields.iter() {
        match (column, value) {
            ("username", FieldValue::Text(v)) => user.username = v.clone(),
            ("email", FieldValue::Text(v)) => user.email = v.clone(),
            ("password_hash", FieldValue::Text(v)) => user.password_hash = v.clone(),
            _ => return Err(StoreError::UnknownField(column)),
        }
    }
    Ok(())
}

fn apply_collection(collection: &mut Collection, fields: &FieldSet) -> Result<(), StoreError> {
    for (column, value) in fields.iter() {
        match (column, value) {
            ("name", FieldValue::Text(v)) => collection.name = v.clone(),
            ("description", FieldValue::Text(v)) => collection.description = v.clone(),
            _ => return Err(StoreError::UnknownField(column)),
        }
    }
    Ok(())
}

fn apply_word(word: &mut Word, fields: &FieldSet) -> Result<(), StoreError> {
    for (column, value) in fields.iter() {
        match (column, value) {
            ("collection_id", FieldValue::Id(v)) => word.collection_id = *v,
            ("word", FieldValue::Text(v)) => word.word = v.clone(),
            ("translation", FieldValue::Text(v)) => word.translation = v.clone(),
            ("difficulty", FieldValue::Integer(v)) => word.difficulty = *v,
            _ => return Err(StoreError::UnknownField(column)),
        }
    }
    Ok(())
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn collection_exists(&self, id: Uuid) -> bool {
        self.collections.iter().any(|c| c.id == id)
    }

    fn remove_collections_of(&mut self, user_id: Uuid) {
        let owned: Vec<Uuid> = self
            .collections
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.id)
            .collect();
        self.collections.retain(|c| c.user_id != user_id);
        self.words.retain(|w| !owned.contains(&w.collection_id));
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.check_available()?;
        Ok(self.tables.read().await.users.clone())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        tables.users.push(user.clone());
        self.record_write();
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, fields: &FieldSet) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        if fields.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }
        let mut tables = self.tables.write().await;
        let Some(index) = tables.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };

        let mut updated = tables.users[index].clone();
        apply_user(&mut updated, fields)?;
        if tables.email_taken(&updated.email, Some(id)) {
            return Err(StoreError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        tables.users[index] = updated.clone();
        self.record_write();
        Ok(Some(updated))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        tables.remove_collections_of(id);
        self.record_write();
        Ok(true)
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        self.check_available()?;
        Ok(self.tables.read().await.collections.clone())
    }

    async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.collections.iter().find(|c| c.id == id).cloned())
    }

    async fn create_collection(&self, collection: Collection) -> Result<Collection, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == collection.user_id) {
            return Err(StoreError::MissingReference(format!(
                "user {} does not exist",
                collection.user_id
            )));
        }
        tables.collections.push(collection.clone());
        self.record_write();
        Ok(collection)
    }

    async fn update_collection(
        &self,
        id: Uuid,
        fields: &FieldSet,
    ) -> Result<Option<Collection>, StoreError> {
        self.check_available()?;
        if fields.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }
        let mut tables = self.tables.write().await;
        let Some(collection) = tables.collections.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        let mut updated = collection.clone();
        apply_collection(&mut updated, fields)?;
        *collection = updated.clone();
        self.record_write();
        Ok(Some(updated))
    }

    async fn delete_collection(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let before = tables.collections.len();
        tables.collections.retain(|c| c.id != id);
        if tables.collections.len() == before {
            return Ok(false);
        }
        tables.words.retain(|w| w.collection_id != id);
        self.record_write();
        Ok(true)
    }

    async fn list_words(&self, collection_id: Uuid) -> Result<Vec<Word>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .words
            .iter()
            .filter(|w| w.collection_id == collection_id)
            .cloned()
            .collect())
    }

    async fn get_word(&self, id: Uuid) -> Result<Option<Word>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.words.iter().find(|w| w.id == id).cloned())
    }

    async fn create_word(&self, word: Word) -> Result<Word, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if !tables.collection_exists(word.collection_id) {
            return Err(StoreError::MissingReference(format!(
                "collection {} does not exist",
                word.collection_id
            )));
        }
        tables.words.push(word.clone());
        self.record_write();
        Ok(word)
    }

    async fn update_word(&self, id: Uuid, fields: &FieldSet) -> Result<Option<Word>, StoreError> {
        self.check_available()?;
        if fields.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }
        let mut tables = self.tables.write().await;
        let Some(index) = tables.words.iter().position(|w| w.id == id) else {
            return Ok(None);
        };

        let mut updated = tables.words[index].clone();
        apply_word(&mut updated, fields)?;
        if !tables.collection_exists(updated.collection_id) {
            return Err(StoreError::MissingReference(format!(
                "collection {} does not exist",
                updated.collection_id
            )));
        }

        tables.words[index] = updated.clone();
        self.record_write();
        Ok(Some(updated))
    }

    async fn delete_word(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let before = tables.words.len();
        tables.words.retain(|w| w.id != id);
        let removed = tables.words.len() != before;
        if removed {
            self.record_write();
        }
        Ok(removed)
    }
}
