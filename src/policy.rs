//! Ownership-or-admin authorization, shared by every entity service.

use uuid::Uuid;

use crate::{auth::AuthUser, error::ServiceError, models::Role};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// decide
///
/// Pure decision over the caller and the owner of the target resource. Admins
/// may act on anything; everyone else only on what they own.
pub fn decide(caller_id: Uuid, caller_role: Role, owner_id: Uuid) -> Decision {
    if caller_role == Role::Admin || caller_id == owner_id {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// authorize
///
/// Applies `decide` for an authenticated caller and turns a denial into
/// `Forbidden` carrying `action` (e.g. "update this collection").
pub fn authorize(caller: &AuthUser, owner_id: Uuid, action: &str) -> Result<(), ServiceError> {
    match decide(caller.id, caller.role, owner_id) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::warn!(caller = %caller.id, owner = %owner_id, action, "authorization denied");
            Err(ServiceError::Forbidden(format!(
                "You are not authorized to {action}"
            )))
        }
    }
}
