//! # Rusty-Blog Binary
//!
//! Loads settings, wires the adapters into the services and serves HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use api_adapters::{AppState, Metrics, WebSettings};
use auth_adapters::{Argon2Hasher, JwtIssuer, NoopCaptcha, RecaptchaVerifier};
use configs::{LogSettings, Settings};
use domains::{CaptchaVerifier, MediaStore};
use secrecy::ExposeSecret;
use services::{CommentService, PostService, UserService};
use storage_adapters::{
    LocalMediaStore, SqliteCategoryRepo, SqliteCommentRepo, SqlitePostRepo, SqliteTagRepo, SqliteUserRepo,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);

    if let Some(dir) = database_dir(&settings.database.url) {
        tokio::fs::create_dir_all(dir).await.context("creating database directory")?;
    }
    let pool = storage_adapters::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("opening database")?;
    tracing::info!(url = %settings.database.url, "database ready");

    tokio::fs::create_dir_all(&settings.media.root)
        .await
        .context("creating media directory")?;
    let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(
        settings.media.root.clone(),
        settings.media.url_prefix.clone(),
    ));

    let captcha: Arc<dyn CaptchaVerifier> = match &settings.captcha.secret {
        Some(secret) if settings.captcha_enabled() => {
            Arc::new(RecaptchaVerifier::new(secret.expose_secret()).context("building captcha client")?)
        }
        _ => {
            tracing::warn!("no captcha secret configured, comments are accepted without verification");
            Arc::new(NoopCaptcha)
        }
    };

    let posts = Arc::new(SqlitePostRepo::new(pool.clone()));
    let tags = Arc::new(SqliteTagRepo::new(pool.clone()));
    let categories = Arc::new(SqliteCategoryRepo::new(pool.clone()));
    let comments = Arc::new(SqliteCommentRepo::new(pool.clone()));
    let users = Arc::new(SqliteUserRepo::new(pool));

    let state = AppState {
        posts: Arc::new(PostService::new(
            posts.clone(),
            tags,
            categories,
            comments.clone(),
            media.clone(),
        )),
        comments: Arc::new(CommentService::new(posts, comments, captcha)),
        users: Arc::new(UserService::new(users, Arc::new(Argon2Hasher::new()))),
        tokens: Arc::new(JwtIssuer::new(
            settings.auth.jwt_secret.expose_secret().as_bytes(),
            chrono::Duration::hours(settings.auth.session_ttl_hours),
        )),
        media,
        metrics: Arc::new(Metrics::new()),
        web: Arc::new(WebSettings {
            cookie_secure: settings.auth.cookie_secure,
            session_ttl_hours: settings.auth.session_ttl_hours,
            captcha_site_key: settings.captcha.site_key.clone(),
            media_root: settings.media.root.clone(),
            media_url_prefix: settings.media.url_prefix.clone(),
            max_upload_bytes: settings.media.max_upload_bytes,
        }),
    };

    let addr = settings.server.addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "Rusty-Blog listening");

    axum::serve(
        listener,
        api_adapters::router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("serving HTTP")?;

    tracing::info!("shut down cleanly");
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Parent directory of a file-backed SQLite URL.
fn database_dir(url: &str) -> Option<&std::path::Path> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    std::path::Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
