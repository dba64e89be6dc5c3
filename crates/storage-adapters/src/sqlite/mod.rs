//! # SQLite repositories
//!
//! Maps the relational schema in `migrations/` to the domain models.
//! Every repository is a thin wrapper around a shared [`SqlitePool`].

mod categories;
mod comments;
mod posts;
mod tags;
mod users;

use std::str::FromStr;
use std::time::Duration;

use domains::DomainError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use sqlx::sqlite::SqlitePool;

pub use categories::SqliteCategoryRepo;
pub use comments::SqliteCommentRepo;
pub use posts::SqlitePostRepo;
pub use tags::SqliteTagRepo;
pub use users::SqliteUserRepo;

/// Opens a pool and brings the schema up to date.
///
/// An in-memory URL gets a single connection that is never recycled,
/// since every SQLite memory connection is its own database.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let in_memory = url.contains(":memory:") || url.contains("mode=memory");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::debug!("database migrations applied");
    Ok(())
}

/// Translates driver failures at the port boundary.
pub(crate) fn db_err(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DomainError::Conflict(db.message().to_owned()),
        _ => {
            tracing::error!(error = %err, "database operation failed");
            DomainError::internal(err)
        }
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `LIKE … ESCAPE '\'`.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
