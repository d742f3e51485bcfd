use uuid::Uuid;
use validator::Validate;

use super::parse_id;
use crate::{
    auth::{AuthUser, TokenService},
    error::ServiceError,
    models::{LoginRequest, RegisterUserRequest, Role, User, UserPatch, UserProfile},
    password::PasswordHasher,
    policy::authorize,
    repository::{FieldSet, FieldValue, RepositoryState},
};

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// UserService
///
/// Registration, login and self-service account management. Only the account
/// holder or an admin may update or delete an account.
#[derive(Clone)]
pub struct UserService {
    repo: RepositoryState,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl UserService {
    pub fn new(repo: RepositoryState, tokens: TokenService) -> Self {
        Self {
            repo,
            hasher: PasswordHasher::new(),
            tokens,
        }
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>, ServiceError> {
        let users = self.repo.list_users().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn get(&self, raw_id: &str) -> Result<UserProfile, ServiceError> {
        let id = parse_id(raw_id, "user")?;
        self.load(id).await.map(UserProfile::from)
    }

    /// register
    ///
    /// Creates a new account. The role is always `user`; admins are provisioned
    /// directly in the store.
    pub async fn register(&self, request: RegisterUserRequest) -> Result<UserProfile, ServiceError> {
        request.validate()?;

        let user = User {
            id: Uuid::new_v4(),
            username: request.username,
            email: request.email,
            password_hash: self.hasher.hash_blocking(request.password).await?,
            role: Role::User,
        };

        let created = self.repo.create_user(user).await?;
        tracing::info!(user_id = %created.id, "user registered");
        Ok(created.into())
    }

    /// update
    ///
    /// Applies only the supplied fields. A new password is hashed before it is
    /// stored, and only after the caller has been authorized.
    pub async fn update(
        &self,
        caller: &AuthUser,
        raw_id: &str,
        patch: UserPatch,
    ) -> Result<UserProfile, ServiceError> {
        let id = parse_id(raw_id, "user")?;
        patch.validate()?;

        let mut fields = FieldSet::new();
        if let Some(username) = patch.username {
            fields.set("username", FieldValue::Text(username));
        }
        if let Some(email) = patch.email {
            fields.set("email", FieldValue::Text(email));
        }
        if fields.is_empty() && patch.password.is_none() {
            return Err(ServiceError::NoFieldsToUpdate);
        }

        let current = self.load(id).await?;
        authorize(caller, current.id, "update this user")?;

        if let Some(password) = patch.password {
            let hash = self.hasher.hash_blocking(password).await?;
            fields.set("password_hash", FieldValue::Text(hash));
        }

        let updated = self
            .repo
            .update_user(id, &fields)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;
        Ok(updated.into())
    }

    /// Removes the account along with everything it owns.
    pub async fn delete(&self, caller: &AuthUser, raw_id: &str) -> Result<(), ServiceError> {
        let id = parse_id(raw_id, "user")?;
        let current = self.load(id).await?;
        authorize(caller, current.id, "delete this user")?;

        if !self.repo.delete_user(id).await? {
            return Err(ServiceError::NotFound("User"));
        }
        tracing::info!(user_id = %id, deleted_by = %caller.id, "user deleted");
        Ok(())
    }

    /// login
    ///
    /// Exchanges credentials for a session token carrying the stored role. An
    /// unknown email and a wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<String, ServiceError> {
        request.validate()?;

        let user = match self.repo.find_user_by_email(&request.email).await? {
            Some(user) => {
                let matches = self
                    .hasher
                    .verify_blocking(user.password_hash.clone(), request.password)
                    .await;
                matches.then_some(user)
            }
            None => None,
        };
        let Some(user) = user else {
            tracing::info!("login rejected");
            return Err(ServiceError::Unauthenticated(BAD_CREDENTIALS.to_string()));
        };

        self.tokens.issue(user.id, user.role)
    }

    async fn load(&self, id: Uuid) -> Result<User, ServiceError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }
}
