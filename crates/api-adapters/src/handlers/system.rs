use axum::response::IntoResponse;

pub async fn health() -> impl IntoResponse {
    "ok"
}

/// Fallback for unknown routes.
pub async fn not_found() -> crate::error::ApiError {
    domains::DomainError::not_found("page", "route").into()
}
