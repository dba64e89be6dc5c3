//! # seed
//!
//! Prepares a database for use: categories, an optional first account and
//! the home page slider.
//!
//! ```text
//! seed                          # default categories
//! seed --category "Rust" ...    # explicit categories
//! seed --slider 3 --slider 7    # feature posts on the home page
//! seed --unslider 3
//! ```
//!
//! `RUSTY_BLOG__ADMIN__USERNAME`, `..._EMAIL` and `..._PASSWORD` create an account.

use std::sync::Arc;

use anyhow::{bail, Context};
use auth_adapters::Argon2Hasher;
use configs::Settings;
use domains::{slugify, CategoryRepository, DomainError};
use services::{RegisterInput, UserService};
use storage_adapters::{SqliteCategoryRepo, SqlitePostRepo, SqliteUserRepo};

const DEFAULT_CATEGORIES: &[&str] = &["General", "Programming", "Databases", "Web", "News"];

#[derive(Debug, Default)]
struct Args {
    categories: Vec<String>,
    slider_on: Vec<i64>,
    slider_off: Vec<i64>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = || args.next().with_context(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--category" => parsed.categories.push(value()?),
            "--slider" => parsed.slider_on.push(value()?.parse().context("--slider takes a post id")?),
            "--unslider" => parsed.slider_off.push(value()?.parse().context("--unslider takes a post id")?),
            other => bail!("unknown argument {other}"),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = parse_args(std::env::args().skip(1))?;
    let settings = Settings::load().context("loading configuration")?;
    let pool = storage_adapters::connect(&settings.database.url, 1)
        .await
        .context("opening database")?;

    let categories = SqliteCategoryRepo::new(pool.clone());
    let titles: Vec<String> = if args.categories.is_empty() {
        DEFAULT_CATEGORIES.iter().map(|t| t.to_string()).collect()
    } else {
        args.categories.clone()
    };
    for title in &titles {
        let category = categories.get_or_create(title, &slugify(title)).await?;
        tracing::info!(id = category.id, title = %category.title, "category ready");
    }

    seed_admin(&pool).await?;

    let posts = SqlitePostRepo::new(pool);
    for (ids, on) in [(&args.slider_on, true), (&args.slider_off, false)] {
        for &id in ids {
            if posts.set_slider(id, on).await? {
                tracing::info!(post_id = id, on, "slider flag set");
            } else {
                tracing::warn!(post_id = id, "no such post");
            }
        }
    }
    Ok(())
}

async fn seed_admin(pool: &storage_adapters::sqlite::SqlitePool) -> anyhow::Result<()> {
    let (Ok(username), Ok(password)) = (
        std::env::var("RUSTY_BLOG__ADMIN__USERNAME"),
        std::env::var("RUSTY_BLOG__ADMIN__PASSWORD"),
    ) else {
        return Ok(());
    };
    let email = std::env::var("RUSTY_BLOG__ADMIN__EMAIL").unwrap_or_else(|_| format!("{username}@localhost"));

    let users = UserService::new(
        Arc::new(SqliteUserRepo::new(pool.clone())),
        Arc::new(Argon2Hasher::new()),
    );
    let input = RegisterInput {
        username,
        email,
        password1: password.clone(),
        password2: password,
    };
    match users.register(input).await {
        Ok(user) => tracing::info!(user_id = user.id, "account created"),
        Err(DomainError::Validation(errors)) => tracing::warn!(%errors, "account not created"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> anyhow::Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_repeated_flags() {
        let parsed = args(&["--category", "Rust", "--slider", "3", "--category", "Go", "--unslider", "4"]).unwrap();
        assert_eq!(parsed.categories, ["Rust", "Go"]);
        assert_eq!(parsed.slider_on, [3]);
        assert_eq!(parsed.slider_off, [4]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(args(&["--slider", "three"]).is_err());
        assert!(args(&["--slider"]).is_err());
        assert!(args(&["--nope"]).is_err());
    }
}
