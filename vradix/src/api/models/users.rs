//! API request/response models for users.

use crate::db::models::users::{UserDBResponse, UserType};
use crate::errors::{Error, Result};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User summary returned by the auth endpoints and embedded in other responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub user_type: UserType,
    pub xp: i32,
    pub level: i32,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            username: db.username,
            user_type: db.user_type,
            xp: db.xp,
            level: db.level,
        }
    }
}

/// The authenticated caller, resolved from the bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub user_type: UserType,
    pub is_staff: bool,
}

impl CurrentUser {
    /// Fail with 403 unless the caller is staff
    pub fn require_staff(&self, action: &str) -> Result<()> {
        if self.is_staff {
            Ok(())
        } else {
            Err(Error::InsufficientPermissions { action: action.to_string() })
        }
    }

    /// Staff may act on any record; everyone else only on their own
    pub fn can_access(&self, owner: Option<UserId>) -> bool {
        self.is_staff || owner == Some(self.id)
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            username: db.username,
            user_type: db.user_type,
            is_staff: db.is_staff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(is_staff: bool) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            user_type: UserType::Student,
            is_staff,
        }
    }

    #[test]
    fn test_require_staff() {
        assert!(user(true).require_staff("approve corrections").is_ok());
        let err = user(false).require_staff("approve corrections").unwrap_err();
        assert_eq!(err.user_message(), "Insufficient permissions to approve corrections");
    }

    #[test]
    fn test_can_access() {
        let owner = user(false);
        assert!(owner.can_access(Some(owner.id)));
        assert!(!owner.can_access(Some(Uuid::new_v4())));
        assert!(!owner.can_access(None));
        assert!(user(true).can_access(None));
    }
}
