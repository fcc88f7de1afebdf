/// HTTP layer: thin glue from request to service/repository call to the
/// response envelope. No SQL and no business rules live here.
pub mod comments;
pub mod dashboard;
pub mod health;
pub mod likes;
pub mod multipart;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use crate::error::{AppError, Result};
use uuid::Uuid;

/// Path and query ids arrive as strings; a malformed id is the caller's
/// mistake (400), never a lookup miss (404).
pub fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|_| AppError::Validation(format!("invalid {what} id: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uuid_classifies_garbage_as_validation() {
        match parse_uuid("not-a-uuid", "video") {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("video"));
                assert!(msg.contains("not-a-uuid"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn parse_uuid_accepts_canonical_form() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string(), "video").unwrap(), id);
    }
}
