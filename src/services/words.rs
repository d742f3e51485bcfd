use uuid::Uuid;
use validator::Validate;

use super::parse_id;
use crate::{
    auth::AuthUser,
    error::ServiceError,
    models::{CreateWordRequest, Word, WordPatch},
    policy::authorize,
    repository::{FieldSet, FieldValue, RepositoryState, StoreError},
};

/// WordService
///
/// Words have no owner of their own. Every mutation resolves the owner in two
/// hops (word → collection → user) and authorizes against that.
///
/// The hops and the write are separate store calls. A collection deleted in
/// between surfaces as a store error, never as a panic or a silent success.
#[derive(Clone)]
pub struct WordService {
    repo: RepositoryState,
}

impl WordService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// Words of one collection. An unknown collection simply has no words.
    pub async fn list(&self, raw_collection_id: &str) -> Result<Vec<Word>, ServiceError> {
        let collection_id = parse_id(raw_collection_id, "collection")?;
        Ok(self.repo.list_words(collection_id).await?)
    }

    pub async fn get(&self, raw_id: &str) -> Result<Word, ServiceError> {
        let id = parse_id(raw_id, "word")?;
        self.load(id).await
    }

    /// create
    ///
    /// Adds a word to the collection named in the path. Only that collection's
    /// owner or an admin may do so.
    pub async fn create(
        &self,
        caller: &AuthUser,
        raw_collection_id: &str,
        request: CreateWordRequest,
    ) -> Result<Word, ServiceError> {
        let collection_id = parse_id(raw_collection_id, "collection")?;
        request.validate()?;

        let owner = self
            .repo
            .get_collection(collection_id)
            .await?
            .ok_or(ServiceError::NotFound("Collection"))?
            .user_id;
        authorize(caller, owner, "add words to this collection")?;

        let word = Word {
            id: Uuid::new_v4(),
            collection_id,
            word: request.word,
            translation: request.translation,
            difficulty: request.difficulty,
        };

        let created = self.repo.create_word(word).await?;
        tracing::info!(word_id = %created.id, collection_id = %collection_id, "word created");
        Ok(created)
    }

    /// update
    ///
    /// Moving a word (`collectionId`) requires authorization on both the current
    /// collection and the target one.
    pub async fn update(
        &self,
        caller: &AuthUser,
        raw_id: &str,
        patch: WordPatch,
    ) -> Result<Word, ServiceError> {
        let id = parse_id(raw_id, "word")?;
        patch.validate()?;

        let target = patch
            .collection_id
            .as_deref()
            .map(|raw| parse_id(raw, "collection"))
            .transpose()?;

        let mut fields = FieldSet::new();
        if let Some(collection_id) = target {
            fields.set("collection_id", FieldValue::Id(collection_id));
        }
        if let Some(word) = patch.word {
            fields.set("word", FieldValue::Text(word));
        }
        if let Some(translation) = patch.translation {
            fields.set("translation", FieldValue::Text(translation));
        }
        if let Some(difficulty) = patch.difficulty {
            fields.set("difficulty", FieldValue::Integer(difficulty));
        }
        if fields.is_empty() {
            return Err(ServiceError::NoFieldsToUpdate);
        }

        let current = self.load(id).await?;
        let owner = self.owner_of(&current).await?;
        authorize(caller, owner, "update this word")?;

        if let Some(collection_id) = target.filter(|target| *target != current.collection_id) {
            let new_owner = self
                .repo
                .get_collection(collection_id)
                .await?
                .ok_or(ServiceError::NotFound("Collection"))?
                .user_id;
            authorize(caller, new_owner, "move words into this collection")?;
        }

        self.repo
            .update_word(id, &fields)
            .await?
            .ok_or(ServiceError::NotFound("Word"))
    }

    pub async fn delete(&self, caller: &AuthUser, raw_id: &str) -> Result<(), ServiceError> {
        let id = parse_id(raw_id, "word")?;
        let current = self.load(id).await?;
        let owner = self.owner_of(&current).await?;
        authorize(caller, owner, "delete this word")?;

        if !self.repo.delete_word(id).await? {
            return Err(ServiceError::NotFound("Word"));
        }
        tracing::info!(word_id = %id, deleted_by = %caller.id, "word deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Word, ServiceError> {
        self.repo
            .get_word(id)
            .await?
            .ok_or(ServiceError::NotFound("Word"))
    }

    /// Second hop of owner resolution. A word whose collection is gone is a store
    /// inconsistency, reported as a server error rather than "not found".
    async fn owner_of(&self, word: &Word) -> Result<Uuid, ServiceError> {
        match self.repo.get_collection(word.collection_id).await? {
            Some(collection) => Ok(collection.user_id),
            None => {
                tracing::error!(
                    word_id = %word.id,
                    collection_id = %word.collection_id,
                    "word references a missing collection"
                );
                Err(StoreError::MissingReference(format!(
                    "collection {} of word {}",
                    word.collection_id, word.id
                ))
                .into())
            }
        }
    }
}
