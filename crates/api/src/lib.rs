//! Bazaar API library.
//!
//! The REST backend (auth, categories, products, orders) as a library so the
//! binary, the CLI and the tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use routes::create_router;
pub use state::AppState;
