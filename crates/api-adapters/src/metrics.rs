//! Prometheus counters exposed on `/metrics`.

use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use crate::state::AppState;

const OPENMETRICS: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StatusLabels {
    pub class: String,
}

pub struct Metrics {
    registry: Registry,
    pub post_views: Counter,
    pub posts_created: Counter,
    pub comments_created: Counter,
    pub logins: Family<OutcomeLabels, Counter>,
    pub http_responses: Family<StatusLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("rusty_blog");
        let post_views = Counter::default();
        let posts_created = Counter::default();
        let comments_created = Counter::default();
        let logins = Family::<OutcomeLabels, Counter>::default();
        let http_responses = Family::<StatusLabels, Counter>::default();

        registry.register("post_views", "Post detail page views", post_views.clone());
        registry.register("posts_created", "Posts created", posts_created.clone());
        registry.register("comments_created", "Comments accepted", comments_created.clone());
        registry.register("logins", "Login attempts by outcome", logins.clone());
        registry.register("http_responses", "HTTP responses by status class", http_responses.clone());

        Self {
            registry,
            post_views,
            posts_created,
            comments_created,
            logins,
            http_responses,
        }
    }

    pub fn login(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.logins
            .get_or_create(&OutcomeLabels {
                outcome: outcome.to_owned(),
            })
            .inc();
    }

    pub fn response(&self, status: StatusCode) {
        let class = format!("{}xx", status.as_u16() / 100);
        self.http_responses.get_or_create(&StatusLabels { class }).inc();
    }

    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts every response by status class.
pub async fn track_responses(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    state.metrics.response(response.status());
    response
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => ([(CONTENT_TYPE, OPENMETRICS)], body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_the_exposition() {
        let metrics = Metrics::new();
        metrics.post_views.inc();
        metrics.post_views.inc();
        metrics.login(false);
        metrics.response(StatusCode::NOT_FOUND);

        let body = metrics.encode().unwrap();
        assert!(body.contains("rusty_blog_post_views_total 2"));
        assert!(body.contains("rusty_blog_logins_total{outcome=\"failure\"} 1"));
        assert!(body.contains("rusty_blog_http_responses_total{class=\"4xx\"} 1"));
    }
}
