//! # storage-adapters
//!
//! Persistence and media implementations of the ports declared in `domains`.
//! Each backend sits behind a cargo feature so binaries only compile what they wire.

#[cfg(feature = "db-sqlite")]
pub mod sqlite;

#[cfg(feature = "media-local")]
pub mod media;

#[cfg(feature = "db-sqlite")]
pub use sqlite::{
    connect, SqliteCategoryRepo, SqliteCommentRepo, SqlitePostRepo, SqliteTagRepo, SqliteUserRepo,
};

#[cfg(feature = "media-local")]
pub use media::LocalMediaStore;
