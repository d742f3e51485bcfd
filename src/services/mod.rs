//! Entity services: validation, ownership checks and persistence for users,
//! collections and words. Handlers only translate HTTP to and from these calls.

use uuid::Uuid;

use crate::error::ServiceError;

mod collections;
mod users;
mod words;

pub use collections::CollectionService;
pub use users::UserService;
pub use words::WordService;

/// Parses an externally supplied identifier. `what` names the entity in the
/// error message ("Invalid collection ID").
pub fn parse_id(raw: &str, what: &'static str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::InvalidIdentifier(what))
}
