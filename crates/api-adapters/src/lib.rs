//! # api-adapters
//!
//! The web layer of Rusty-Blog: axum routes, session extractors, askama pages
//! and Prometheus metrics on top of the `services` crate.

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod multipart;
pub mod session;
pub mod state;
pub mod templates;
pub mod views;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;

pub use error::ApiError;
pub use metrics::Metrics;
pub use state::{AppState, WebSettings};

use handlers::{posts, system, users};

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let media = ServeDir::new(&state.web.media_root);
    let media_prefix = state.web.media_url_prefix.clone();
    let max_upload = state.web.max_upload_bytes;

    let routes = Router::new()
        .route("/", get(posts::index))
        .route("/post/create", get(posts::create_form).post(posts::create))
        .route("/post/{id}/update", get(posts::update_form).post(posts::update))
        .route("/post/{id}/delete", get(posts::delete_form).post(posts::delete))
        .route("/post/{id}/{slug}", get(posts::detail).post(posts::comment))
        .route("/category/{id}", get(posts::category))
        .route("/tag/{slug}", get(posts::tag))
        .route("/search", get(posts::search))
        .route("/users", get(users::user_list))
        .route("/users/register", get(users::register_form).post(users::register))
        .route("/users/login", get(users::login_form).post(users::login))
        .route("/users/logout", get(users::logout).post(users::logout))
        .route("/users/profile", get(users::profile))
        .route(
            "/users/profile/{slug}/update",
            get(users::profile_update_form).post(users::profile_update),
        )
        .route("/users/{id}/posts", get(users::user_posts))
        .route("/health", get(system::health))
        .route("/metrics", get(metrics::metrics_handler))
        .nest_service(&media_prefix, media)
        .fallback(system::not_found)
        .layer(axum::middleware::from_fn_with_state(state.clone(), metrics::track_responses))
        .with_state(state);

    middleware::standard_layers(routes, max_upload)
}
