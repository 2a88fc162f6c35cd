//! Access token issuing and verification.
//!
//! Tokens are HS256 JWTs signed with a process-wide secret:
//!
//! ```text
//! { "id": "<user id>", "username": "<optional>", "iat": 1735750800, "exp": 1735754400 }
//! ```
//!
//! Tokens are never logged.

use chrono::{Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::Identity;

/// Default cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Default access token lifetime.
pub const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 1;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no access token on request")]
    Missing,

    #[error("access token has expired")]
    Expired,

    #[error("invalid access token: {0}")]
    Invalid(String),

    #[error("failed to sign access token: {0}")]
    Signing(String),
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Missing => "missing_token",
            TokenError::Expired => "token_expired",
            TokenError::Invalid(_) => "invalid_token",
            TokenError::Signing(_) => "token_signing_failed",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

/// Verifies access tokens against a shared secret.
#[derive(Clone)]
pub struct CredentialVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier {
    pub fn new(secret: &[u8], cookie_name: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            cookie_name: cookie_name.into(),
        }
    }

    /// Name of the cookie the token is read from.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Checks signature and expiry and returns the identity the token names.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        let Claims { id, username, .. } = data.claims;

        if id.trim().is_empty() {
            return Err(TokenError::Invalid("token carries no user id".to_string()));
        }

        Ok(Identity {
            user_id: id,
            username,
        })
    }

    /// Signs a token for `identity` valid for `ttl` from now.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            id: identity.user_id.clone(),
            username: identity.username.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new(b"test-secret", ACCESS_TOKEN_COOKIE)
    }

    #[test]
    fn test_issue_then_verify() {
        let verifier = verifier();
        let identity = Identity {
            user_id: "u1".to_string(),
            username: Some("alice".to_string()),
        };
        let token = verifier
            .issue(&identity, Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS))
            .unwrap();

        assert_eq!(verifier.verify(&token).unwrap(), identity);
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = verifier();
        let token = verifier
            .issue(&Identity::new("u1"), Duration::minutes(-5))
            .unwrap();

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
        assert_eq!(err.code(), "token_expired");
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = CredentialVerifier::new(b"other-secret", ACCESS_TOKEN_COOKIE);
        let token = other
            .issue(&Identity::new("u1"), Duration::hours(1))
            .unwrap();

        assert!(matches!(
            verifier().verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_garbage_and_empty_tokens() {
        let verifier = verifier();
        assert!(matches!(
            verifier.verify("not.a.jwt"),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(verifier.verify("  "), Err(TokenError::Missing)));
    }

    #[test]
    fn test_blank_user_id_rejected() {
        let verifier = verifier();
        let token = verifier
            .issue(&Identity::new(""), Duration::hours(1))
            .unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_debug_hides_keys() {
        let rendered = format!("{:?}", verifier());
        assert!(!rendered.contains("test-secret"));
        assert!(rendered.contains("access_token"));
    }
}
