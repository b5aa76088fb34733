//! Account roles.

use serde::{Deserialize, Serialize};

/// Role carried by every account and embedded in its identity claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.user_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Store staff with full access.
    Admin,
    /// Partner who supplies products and sees every order.
    Distributor,
    /// Regular shopper.
    #[default]
    Customer,
}

/// Error returned when a role string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0} (expected admin, distributor or customer)")]
pub struct RoleParseError(pub String);

impl Role {
    /// Whether this role may list every order, not only its own.
    #[must_use]
    pub const fn sees_all_orders(self) -> bool {
        matches!(self, Self::Admin | Self::Distributor)
    }

    /// Whether this role may create and edit catalog products.
    #[must_use]
    pub const fn manages_catalog(self) -> bool {
        matches!(self, Self::Admin | Self::Distributor)
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Distributor => "distributor",
            Self::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "distributor" => Ok(Self::Distributor),
            "customer" => Ok(Self::Customer),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}
