//! Challenge verifiers for anonymous comments.

use async_trait::async_trait;
use domains::{CaptchaVerifier, DomainResult};

/// Accepts every non-empty response. Wired when no captcha secret is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCaptcha;

#[async_trait]
impl CaptchaVerifier for NoopCaptcha {
    async fn verify(&self, response: &str, _remote_ip: Option<String>) -> DomainResult<bool> {
        Ok(!response.is_empty())
    }
}

#[cfg(feature = "captcha-recaptcha")]
pub use recaptcha::RecaptchaVerifier;

#[cfg(feature = "captcha-recaptcha")]
mod recaptcha {
    use std::time::Duration;

    use async_trait::async_trait;
    use domains::{CaptchaVerifier, DomainError, DomainResult};
    use serde::Deserialize;

    pub const SITEVERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

    #[derive(Debug, Deserialize)]
    struct SiteVerifyResponse {
        success: bool,
        #[serde(default, rename = "error-codes")]
        error_codes: Vec<String>,
    }

    /// Google reCAPTCHA v2 `siteverify` client.
    pub struct RecaptchaVerifier {
        client: reqwest::Client,
        secret: String,
        endpoint: String,
    }

    impl RecaptchaVerifier {
        pub fn new(secret: impl Into<String>) -> DomainResult<Self> {
            Self::with_endpoint(secret, SITEVERIFY_URL)
        }

        pub fn with_endpoint(secret: impl Into<String>, endpoint: impl Into<String>) -> DomainResult<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .map_err(DomainError::internal)?;
            Ok(Self {
                client,
                secret: secret.into(),
                endpoint: endpoint.into(),
            })
        }
    }

    #[async_trait]
    impl CaptchaVerifier for RecaptchaVerifier {
        /// An unreachable verification service counts as a failed challenge.
        async fn verify(&self, response: &str, remote_ip: Option<String>) -> DomainResult<bool> {
            let mut form = vec![("secret", self.secret.as_str()), ("response", response)];
            if let Some(ip) = remote_ip.as_deref() {
                form.push(("remoteip", ip));
            }

            let reply = match self.client.post(&self.endpoint).form(&form).send().await {
                Ok(reply) => reply,
                Err(err) => {
                    tracing::warn!(error = %err, "captcha service unreachable");
                    return Ok(false);
                }
            };
            let body: SiteVerifyResponse = match reply.error_for_status() {
                Ok(reply) => match reply.json().await {
                    Ok(body) => body,
                    Err(err) => {
                        tracing::warn!(error = %err, "captcha service sent an unreadable reply");
                        return Ok(false);
                    }
                },
                Err(err) => {
                    tracing::warn!(error = %err, "captcha service returned an error status");
                    return Ok(false);
                }
            };

            if !body.success {
                tracing::debug!(codes = ?body.error_codes, "captcha rejected");
            }
            Ok(body.success)
        }
    }

}
