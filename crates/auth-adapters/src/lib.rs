//! # auth-adapters
//!
//! Credential and anti-automation implementations of the `domains` ports.
//! Password hashing is always compiled; session tokens and the remote
//! challenge verifier sit behind features.

pub mod captcha;
pub mod password;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use captcha::NoopCaptcha;
#[cfg(feature = "captcha-recaptcha")]
pub use captcha::RecaptchaVerifier;
#[cfg(feature = "auth-jwt")]
pub use jwt::JwtIssuer;
pub use password::Argon2Hasher;
