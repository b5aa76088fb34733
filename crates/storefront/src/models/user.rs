//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{Email, Identity, Role, UserId};

/// A storefront account.
///
/// The password hash is never part of this type; it is only returned by the
/// dedicated credential lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Identity claim without a display name (issued at registration).
    #[must_use]
    pub const fn identity(&self) -> Identity {
        Identity::new(self.id, self.role)
    }

    /// Identity claim carrying the username (issued at login).
    #[must_use]
    pub fn named_identity(&self) -> Identity {
        self.identity().with_name(self.username.clone())
    }

    /// Public projection used when orders are listed with their owner.
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Data needed to insert a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Account fields safe to embed in another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: Role,
}
