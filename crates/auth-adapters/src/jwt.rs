//! HS256 session tokens.

use chrono::{Duration, Utc};
use domains::{DomainError, DomainResult, Identity, TokenIssuer, User};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    name: String,
    iat: i64,
    exp: i64,
}

pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user: &User) -> DomainResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|err| {
            tracing::error!(error = %err, user_id = user.id, "failed to sign session token");
            DomainError::internal(err)
        })
    }

    fn verify(&self, token: &str) -> DomainResult<Identity> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            tracing::debug!(error = %err, "session token rejected");
            DomainError::Unauthorized("invalid session".into())
        })?;
        let user_id = data
            .claims
            .sub
            .parse()
            .map_err(|_| DomainError::Unauthorized("invalid session subject".into()))?;
        Ok(Identity {
            user_id,
            username: data.claims.name,
        })
    }
}
