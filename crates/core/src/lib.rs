//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types shared by every Bazaar component:
//! - `api` - The REST backend (auth, categories, products, orders)
//! - `cli` - Command-line tools for migrations and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Enabling the `postgres` feature adds `sqlx` encode/decode
//! support so the same types can be bound directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, emails, roles and statuses
//! - [`slug`] - URL-safe identifiers derived from names
//! - [`pagination`] - Page/limit parsing and page-count math

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pagination;
pub mod slug;
pub mod types;

pub use pagination::{PageRequest, Pagination};
pub use slug::slugify;
pub use types::*;
