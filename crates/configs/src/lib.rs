//! # configs
//!
//! Layered runtime settings for Rusty-Blog.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/local.toml` (optional, not committed)
//! 4. environment variables such as `RUSTY_BLOG__SERVER__PORT=8080`
//!
//! A `.env` file in the working directory is loaded into the environment first.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "RUSTY_BLOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub media: MediaSettings,
    pub captcha: CaptchaSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|err| ConfigError::Invalid(format!("server address: {err}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// e.g. `sqlite://data/blog.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub session_ttl_hours: i64,
    /// Adds `Secure` to session cookies. Enable behind HTTPS.
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub root: PathBuf,
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaSettings {
    /// reCAPTCHA secret. Without it comments are accepted unverified.
    pub secret: Option<SecretString>,
    #[serde(default)]
    pub site_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

impl Settings {
    /// Loads `.env`, then layers defaults, files under `./config` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "ignoring unreadable .env file");
            }
        }
        Self::load_from(Path::new("config"))
    }

    /// Same as [`Settings::load`] without `.env`, reading files from `dir`.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite://data/blog.db")?
            .set_default("database.max_connections", 8)?
            .set_default("auth.session_ttl_hours", 24 * 14)?
            .set_default("auth.cookie_secure", false)?
            .set_default("media.root", "data/media")?
            .set_default("media.url_prefix", "/media")?
            .set_default("media.max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("captcha.site_key", "")?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.auth.jwt_secret.expose_secret().len() < 16 {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret must be at least 16 characters".into(),
            ));
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_hours must be positive".into()));
        }
        let prefix = &self.media.url_prefix;
        if !prefix.starts_with('/') || prefix.trim_end_matches('/').is_empty() {
            return Err(ConfigError::Invalid("media.url_prefix must be a path below '/'".into()));
        }
        Ok(())
    }

    /// `true` when comment challenges are actually verified.
    pub fn captcha_enabled(&self) -> bool {
        use secrecy::ExposeSecret;
        self.captcha
            .secret
            .as_ref()
            .is_some_and(|s| !s.expose_secret().is_empty())
    }
}
