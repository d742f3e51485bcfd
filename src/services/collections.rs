use uuid::Uuid;
use validator::Validate;

use super::parse_id;
use crate::{
    auth::AuthUser,
    error::ServiceError,
    models::{Collection, CollectionPatch, CreateCollectionRequest},
    policy::authorize,
    repository::{FieldSet, FieldValue, RepositoryState},
};

/// CollectionService
///
/// Collections are readable by anyone. Mutations require the owner or an admin.
#[derive(Clone)]
pub struct CollectionService {
    repo: RepositoryState,
}

impl CollectionService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Collection>, ServiceError> {
        Ok(self.repo.list_collections().await?)
    }

    pub async fn get(&self, raw_id: &str) -> Result<Collection, ServiceError> {
        let id = parse_id(raw_id, "collection")?;
        self.load(id).await
    }

    /// create
    ///
    /// The owner is always the authenticated caller.
    pub async fn create(
        &self,
        caller: &AuthUser,
        request: CreateCollectionRequest,
    ) -> Result<Collection, ServiceError> {
        request.validate()?;

        let collection = Collection {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
            user_id: caller.id,
        };

        let created = self.repo.create_collection(collection).await?;
        tracing::info!(collection_id = %created.id, owner = %created.user_id, "collection created");
        Ok(created)
    }

    pub async fn update(
        &self,
        caller: &AuthUser,
        raw_id: &str,
        patch: CollectionPatch,
    ) -> Result<Collection, ServiceError> {
        let id = parse_id(raw_id, "collection")?;
        patch.validate()?;

        let mut fields = FieldSet::new();
        if let Some(name) = patch.name {
            fields.set("name", FieldValue::Text(name));
        }
        if let Some(description) = patch.description {
            fields.set("description", FieldValue::Text(description));
        }
        if fields.is_empty() {
            return Err(ServiceError::NoFieldsToUpdate);
        }

        let current = self.load(id).await?;
        authorize(caller, current.user_id, "update this collection")?;

        self.repo
            .update_collection(id, &fields)
            .await?
            .ok_or(ServiceError::NotFound("Collection"))
    }

    /// Removes the collection and its words.
    pub async fn delete(&self, caller: &AuthUser, raw_id: &str) -> Result<(), ServiceError> {
        let id = parse_id(raw_id, "collection")?;
        let current = self.load(id).await?;
        authorize(caller, current.user_id, "delete this collection")?;

        if !self.repo.delete_collection(id).await? {
            return Err(ServiceError::NotFound("Collection"));
        }
        tracing::info!(collection_id = %id, deleted_by = %caller.id, "collection deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Collection, ServiceError> {
        self.repo
            .get_collection(id)
            .await?
            .ok_or(ServiceError::NotFound("Collection"))
    }
}
