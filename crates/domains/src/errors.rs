//! # DomainError
//!
//! Centralized error handling for the Rusty-Blog workspace.
//! Adapters translate their own failures into these variants at the port boundary.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Field name used for errors that do not belong to a single input.
pub const NON_FIELD: &str = "__all__";

/// The primary error type for all domain and service operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Resource not found (e.g., Post, Tag, Category)
    #[error("{entity} not found with {key}")]
    NotFound { entity: &'static str, key: String },

    /// One or more submitted form fields were rejected.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The request needs an authenticated user.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The authenticated user does not own the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down, disk full, captcha service timeout)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for Rusty-Blog logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;

/// Validation messages keyed by form field, in a stable order for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages for one field; empty when the field is valid.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Folds the collected messages into a result.
    pub fn into_result(self) -> DomainResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_fold_to_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn messages_accumulate_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("title", "This field is required.");
        errors.add("title", "Too long.");
        errors.add("email", "Enter a valid email address.");

        assert_eq!(errors.get("title").len(), 2);
        assert!(errors.get("content").is_empty());
        assert_eq!(
            errors.to_string(),
            "email: Enter a valid email address.; title: This field is required.; title: Too long."
        );
        assert!(matches!(errors.into_result(), Err(DomainError::Validation(_))));
    }
}
