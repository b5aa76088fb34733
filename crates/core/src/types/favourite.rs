//! Favourite membership changes.

use serde::{Deserialize, Serialize};

/// How a favourite request should change membership of a product in a
/// user's favourites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FavouriteChange {
    /// Ensure the product is a favourite.
    Add,
    /// Ensure the product is not a favourite.
    Remove,
    /// Flip the current state.
    #[default]
    Toggle,
}

impl FavouriteChange {
    /// Membership after applying this change to the current membership.
    #[must_use]
    pub const fn target(self, currently: bool) -> bool {
        match self {
            Self::Add => true,
            Self::Remove => false,
            Self::Toggle => !currently,
        }
    }
}
