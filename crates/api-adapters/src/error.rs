//! # ApiError
//!
//! Maps service failures onto HTTP responses. Validation errors normally never
//! get here: handlers catch them and re-render their form.

use askama::Template;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use domains::DomainError;
use thiserror::Error;

use crate::templates::{NotFoundTemplate, ServerErrorTemplate};
use crate::views::PageContext;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

pub type ApiResult<T = Response> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(DomainError::NotFound { entity, key }) => {
                tracing::debug!(entity, key = %key, "not found");
                page(StatusCode::NOT_FOUND, &NotFoundTemplate { ctx: PageContext::anonymous() })
            }
            ApiError::Domain(DomainError::Forbidden(reason)) => {
                tracing::debug!(%reason, "forbidden, redirecting home");
                Redirect::to("/").into_response()
            }
            ApiError::Domain(DomainError::Unauthorized(_)) => Redirect::to("/users/login").into_response(),
            ApiError::Domain(DomainError::Validation(errors)) => {
                tracing::debug!(%errors, "unhandled validation failure");
                (StatusCode::BAD_REQUEST, errors.to_string()).into_response()
            }
            ApiError::Multipart(err) => {
                tracing::warn!(error = %err, "rejected multipart body");
                err.into_response()
            }
            other => {
                tracing::error!(error = %other, "request failed");
                page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &ServerErrorTemplate { ctx: PageContext::anonymous() },
                )
            }
        }
    }
}

fn page<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "error page failed to render");
            status.into_response()
        }
    }
}

/// Renders a template as a 200 HTML response.
pub fn render<T: Template>(template: &T) -> ApiResult {
    Ok(Html(template.render()?).into_response())
}
