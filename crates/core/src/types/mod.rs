//! Core types for Threadline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod favourite;
pub mod id;
pub mod identity;
pub mod price;
pub mod role;

pub use cart::{Cart, CartError, CartItem, NewCartLine, Quantity, QuantityError};
pub use email::{Email, EmailError};
pub use favourite::FavouriteChange;
pub use id::*;
pub use identity::Identity;
pub use price::{Price, PriceError};
pub use role::{Role, RoleParseError};
