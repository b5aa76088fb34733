//! Identity claim embedded in access tokens.

use serde::{Deserialize, Serialize};

use super::{Role, UserId};

/// Who the caller is, as proven by a verified token.
///
/// Never stored on its own; it is derived from a user at register/login time
/// and travels inside the signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Account the token was issued for.
    pub id: UserId,
    /// Role at issue time.
    pub role: Role,
    /// Display name (username). Only present in tokens issued at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Identity {
    /// Identity without a display name.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            name: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
