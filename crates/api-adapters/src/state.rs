use std::path::PathBuf;
use std::sync::Arc;

use domains::{MediaStore, TokenIssuer};
use services::{CommentService, PostService, UserService};

use crate::metrics::Metrics;

/// Web-facing settings the handlers need at request time.
#[derive(Debug, Clone)]
pub struct WebSettings {
    /// Adds `Secure` to every cookie we set.
    pub cookie_secure: bool,
    pub session_ttl_hours: i64,
    /// Empty when the challenge widget is disabled.
    pub captcha_site_key: String,
    pub media_root: PathBuf,
    pub media_url_prefix: String,
    pub max_upload_bytes: usize,
}

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub users: Arc<UserService>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub media: Arc<dyn MediaStore>,
    pub metrics: Arc<Metrics>,
    pub web: Arc<WebSettings>,
}
