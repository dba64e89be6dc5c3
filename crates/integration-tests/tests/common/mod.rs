//! Shared fixtures: an in-memory app plus request helpers.

#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::{AppState, Metrics, WebSettings};
use async_trait::async_trait;
use auth_adapters::{Argon2Hasher, JwtIssuer};
use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use domains::{CaptchaVerifier, CategoryRepository, DomainResult, MediaStore};
use services::{CommentService, PostService, UserService};
use storage_adapters::{
    LocalMediaStore, SqliteCategoryRepo, SqliteCommentRepo, SqlitePostRepo, SqliteTagRepo, SqliteUserRepo,
};
use tempfile::TempDir;
use tower::ServiceExt;

/// The only response the fake challenge accepts.
pub const CAPTCHA_OK: &str = "PASSED";

pub struct FakeCaptcha;

#[async_trait]
impl CaptchaVerifier for FakeCaptcha {
    async fn verify(&self, response: &str, _remote_ip: Option<String>) -> DomainResult<bool> {
        Ok(response == CAPTCHA_OK)
    }
}

pub struct TestApp {
    pub router: Router,
    pub posts: Arc<SqlitePostRepo>,
    pub tags: Arc<SqliteTagRepo>,
    pub category_id: i64,
    pub other_category_id: i64,
    pub media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = storage_adapters::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory database");
        let media_dir = tempfile::tempdir().expect("media dir");

        let posts = Arc::new(SqlitePostRepo::new(pool.clone()));
        let tags = Arc::new(SqliteTagRepo::new(pool.clone()));
        let categories = Arc::new(SqliteCategoryRepo::new(pool.clone()));
        let comments = Arc::new(SqliteCommentRepo::new(pool.clone()));
        let users = Arc::new(SqliteUserRepo::new(pool));
        let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(media_dir.path(), "/media"));

        let category_id = categories.get_or_create("General", "general").await.unwrap().id;
        let other_category_id = categories.get_or_create("Databases", "databases").await.unwrap().id;

        let state = AppState {
            posts: Arc::new(PostService::new(
                posts.clone(),
                tags.clone(),
                categories,
                comments.clone(),
                media.clone(),
            )),
            comments: Arc::new(CommentService::new(posts.clone(), comments, Arc::new(FakeCaptcha))),
            users: Arc::new(UserService::new(users, Arc::new(Argon2Hasher::new()))),
            tokens: Arc::new(JwtIssuer::new(b"integration-test-secret", chrono::Duration::hours(1))),
            media,
            metrics: Arc::new(Metrics::new()),
            web: Arc::new(WebSettings {
                cookie_secure: false,
                session_ttl_hours: 1,
                captcha_site_key: "site-key".into(),
                media_root: media_dir.path().to_path_buf(),
                media_url_prefix: "/media".into(),
                max_upload_bytes: 5 * 1024 * 1024,
            }),
        };

        Self {
            router: api_adapters::router(state),
            posts,
            tags,
            category_id,
            other_category_id,
            media_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("infallible router")
    }

    pub async fn get(&self, uri: &str, session: Option<&str>) -> Response<Body> {
        let mut request = Request::get(uri);
        if let Some(cookie) = session {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)], session: Option<&str>) -> Response<Body> {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let mut request = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = session {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_multipart(&self, uri: &str, form: Multipart, session: Option<&str>) -> Response<Body> {
        let mut request = Request::post(uri).header(CONTENT_TYPE, form.content_type());
        if let Some(cookie) = session {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.finish())).unwrap()).await
    }

    /// Registers `username` and returns a `Cookie` header value for its session.
    pub async fn login_as(&self, username: &str) -> String {
        let password = "correct-horse-battery";
        let response = self
            .post_form(
                "/users/register",
                &[
                    ("username", username),
                    ("email", &format!("{username}@example.com")),
                    ("password1", password),
                    ("password2", password),
                ],
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "registration of {username} failed");

        let response = self
            .post_form("/users/login", &[("username", username), ("password", password)], None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "login of {username} failed");
        session_from(&response).expect("session cookie")
    }

    /// Creates a post through the form and returns its id.
    pub async fn create_post(&self, session: &str, title: &str, tags: &str) -> i64 {
        let form = Multipart::new()
            .text("title", title)
            .text("category", &self.category_id.to_string())
            .text("content", &format!("Body of {title}"))
            .text("tag", tags);
        let response = self.post_multipart("/post/create", form, Some(session)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "post creation failed");
        post_id_from(&location(&response))
    }
}

/// The `name=value` pair of the session cookie set by `response`.
pub fn session_from(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("rb_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

/// `/post/{id}/{slug}` → id
pub fn post_id_from(location: &str) -> i64 {
    location
        .trim_start_matches("/post/")
        .split('/')
        .next()
        .and_then(|id| id.parse().ok())
        .unwrap_or_else(|| panic!("not a post url: {location}"))
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Minimal `multipart/form-data` encoder.
pub struct Multipart {
    boundary: &'static str,
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self {
            boundary: "----rusty-blog-test-boundary",
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}
