//! Business logic services for the storefront.
//!
//! Services borrow the [`Store`](crate::db::Store) for the duration of one
//! request and hold no state of their own.
//!
//! # Services
//!
//! - `auth` - Registration, password login and access tokens
//! - `cart` - Cart merge and removal
//! - `favourites` - Favourite edges between users and products
//! - `catalog` - Product listing and role-gated writes
//! - `orders` - Order placement and scoped listing
//! - `uploads` - Product image files

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod favourites;
pub mod orders;
pub mod uploads;

pub use auth::{AuthError, AuthService, TokenService};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use favourites::FavouriteService;
pub use orders::OrderService;
pub use uploads::{ImageStore, UploadError};
