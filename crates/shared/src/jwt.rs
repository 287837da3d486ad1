//! Bearer-token principal resolution.
//!
//! Cashbook does not manage sign-in or sessions; it consumes an already
//! authenticated principal. This module validates the bearer token carrying
//! that principal and (for tooling and tests) can mint one.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token claims carrying the authenticated principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiration (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// Creates claims for a user expiring at the given time.
    #[must_use]
    pub fn new(user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the authenticated user id.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    Encoding(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    Decoding(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

/// Token service for validating (and minting) principal tokens.
#[derive(Clone)]
pub struct JwtService {
    token_expiry_secs: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("token_expiry_secs", &self.token_expiry_secs)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new token service with the given secret.
    #[must_use]
    pub fn new(secret: &str, token_expiry_secs: u64) -> Self {
        Self {
            token_expiry_secs,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Generates a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Encoding` if token generation fails.
    pub fn generate_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        #[allow(clippy::cast_possible_wrap)]
        let expires_at = Utc::now() + Duration::seconds(self.token_expiry_secs as i64);
        let claims = Claims::new(user_id, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired and
    /// `JwtError::Decoding` if it is malformed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Decoding(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new(user_id, expires_at);

        assert_eq!(claims.sub, user_id);
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_generate_and_validate_round_trip() {
        let service = JwtService::new("test-secret", 3600);
        let user_id = Uuid::new_v4();

        let token = service.generate_token(user_id).expect("token");
        let claims = service.validate_token(&token).expect("claims");

        assert_eq!(claims.user_id(), user_id);
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let service = JwtService::new("test-secret", 3600);
        assert!(matches!(
            service.validate_token("not-a-token"),
            Err(JwtError::Decoding(_))
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_secret() {
        let issuer = JwtService::new("secret-a", 3600);
        let verifier = JwtService::new("secret-b", 3600);
        let token = issuer.generate_token(Uuid::new_v4()).expect("token");

        assert!(verifier.validate_token(&token).is_err());
    }
}
