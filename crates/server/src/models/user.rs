//! Account domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use schoolmall_core::{Email, UserId, UserRole};

/// A store account. The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub phone: Option<String>,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this account may use the `/admin` API.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_active && self.role == UserRole::Admin
    }
}
