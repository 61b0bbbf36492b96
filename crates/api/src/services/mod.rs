//! Business logic services.
//!
//! Each service borrows the pool for the duration of a request and wraps the
//! repositories for its domain:
//!
//! - [`auth`] - Registration, login and bearer token handling
//! - [`categories`] - Category catalog with name/slug uniqueness
//! - [`products`] - Product catalog, listings and lookups
//! - [`orders`] - Checkout, order lifecycle and statistics

pub mod auth;
pub mod categories;
mod error;
pub mod orders;
pub mod products;

pub use error::ServiceError;
