//! Data models
//!
//! Shared between menu-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes.

pub mod category;
pub mod ordering;
pub mod product;
pub mod profile;

// Re-exports
pub use category::*;
pub use ordering::*;
pub use product::*;
pub use profile::*;
