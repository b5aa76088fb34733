//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Shared value types (ids, email, price, cart) live in
//! `threadline_core`.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, Order, OrderDetail, OrderScope};
pub use product::{Product, ProductDraft, ProductFilter, SizeStock};
pub use user::{NewUser, User, UserSummary};
