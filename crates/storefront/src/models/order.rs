//! Order types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{Identity, OrderId, Price, ProductId, UserId};

use super::{Product, UserSummary};

/// A placed order as stored.
///
/// Orders keep product references only; there is no per-line price or
/// quantity snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub products: Vec<ProductId>,
    pub total: Price,
    pub address: String,
    pub date: DateTime<Utc>,
}

/// Validated order fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user: UserId,
    pub products: Vec<ProductId>,
    pub total: Price,
    pub address: String,
}

/// An order with its owner and products resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: OrderId,
    pub user: UserSummary,
    pub products: Vec<Product>,
    pub total: Price,
    pub address: String,
    pub date: DateTime<Utc>,
}

/// Which orders a caller may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Every order in the store.
    All,
    /// Only orders placed by this user.
    PlacedBy(UserId),
}

impl OrderScope {
    /// Scope granted to the caller's role.
    #[must_use]
    pub const fn for_identity(identity: &Identity) -> Self {
        if identity.role.sees_all_orders() {
            Self::All
        } else {
            Self::PlacedBy(identity.id)
        }
    }

    /// Whether an order placed by `user` falls in this scope.
    #[must_use]
    pub fn includes(self, user: UserId) -> bool {
        match self {
            Self::All => true,
            Self::PlacedBy(owner) => owner == user,
        }
    }
}
