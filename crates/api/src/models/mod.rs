//! Domain models for the API.
//!
//! These are the validated shapes handlers and services work with; the
//! database row types live next to their queries in [`crate::db`].

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::{Category, CategorySummary, CategoryWithCount};
pub use order::{Order, OrderItem, OrderStats, OrderView};
pub use product::{Product, ProductView};
pub use user::{User, UserProfile};
