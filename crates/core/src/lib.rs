//! Threadline Core - Shared domain types.
//!
//! This crate provides the types shared by every Threadline component:
//! - `storefront` - HTTP API for accounts, catalog, cart, favourites and orders
//! - `cli` - Command-line tools for migrations, seeding and role management
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain logic - no I/O, no
//! database access, no HTTP. Cart merging and favourite toggling live here so
//! they can be tested without a store.
//!
//! # Modules
//!
//! - [`types`] - IDs, email, price, role, identity, cart lines and favourite changes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
