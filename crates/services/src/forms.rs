//! Submitted form payloads and their declarative validation rules.
//!
//! Handlers deserialize straight into these structs; the services trim them,
//! run `validator` and add the rules that need a store lookup.

use domains::{FieldErrors, Upload};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

pub const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, Default, Validate)]
pub struct PostInput {
    #[validate(length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."))]
    pub title: String,
    /// Raw category id as submitted; resolved against the store by the service.
    pub category: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub content: String,
    /// Comma-separated tag labels. A missing field is the same as an empty one.
    pub tag: String,
    pub image: Option<Upload>,
}

impl PostInput {
    pub(crate) fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_owned();
        self.category = self.category.trim().to_owned();
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub content: String,
    /// The token produced by the challenge widget.
    #[serde(default, rename = "g-recaptcha-response")]
    pub captcha: String,
}

impl CommentInput {
    pub(crate) fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_owned();
        self.email = self.email.trim().to_owned();
        self.captcha = self.captcha.trim().to_owned();
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegisterInput {
    pub(crate) fn trimmed(mut self) -> Self {
        self.username = self.username.trim().to_owned();
        self.email = self.email.trim().to_owned();
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileInput {
    #[serde(default)]
    #[validate(length(max = 100, message = "Ensure this field has at most 100 characters."))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Ensure this field has at most 1000 characters."))]
    pub bio: String,
}

/// Runs the declarative rules of `input` and returns the messages per field.
pub(crate) fn check<T: Validate>(input: &T) -> FieldErrors {
    match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => collect(&errors),
    }
}

fn collect(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string());
            out.add(field.to_string(), message);
        }
    }
    out
}
