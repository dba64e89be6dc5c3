//! rusty-blog/crates/domains/src/lib.rs
//!
//! The central domain model and interface definitions for Rusty-Blog.
//! Nothing in here performs I/O; adapters implement the traits in [`ports`].

pub mod errors;
pub mod models;
pub mod ports;
pub mod slug;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
pub use slug::slugify;
