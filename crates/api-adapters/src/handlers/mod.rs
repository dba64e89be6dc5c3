//! # Handlers
//!
//! Coordinates the flow between HTTP requests and the services.

pub mod posts;
pub mod system;
pub mod users;

use serde::Deserialize;

/// `?page=N` on every listing.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}
