//! services/api/src/token.rs
//!
//! Bearer-token issuance and verification.
//!
//! Tokens are JWTs signed with a shared secret. Verification failures are
//! split by reason so the auth middleware can return the reason-specific
//! 401 messages clients rely on.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by an issued token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    /// Issued-at timestamp (seconds).
    pub iat: i64,
    /// Expiration timestamp (seconds).
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired. Please login again.")]
    Expired,
    #[error("Invalid token. Authentication failed.")]
    Invalid,
    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Issues and verifies bearer tokens. Constructed once in `main` from the
/// configured secret and injected through the application state.
#[derive(Clone)]
pub struct TokenAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl TokenAuthenticator {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours),
        }
    }

    /// Issues a token for the given user identity.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.issue_with_expiry(user_id, email, self.expiry)
    }

    fn issue_with_expiry(
        &self,
        user_id: Uuid,
        email: &str,
        expiry: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + expiry).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Malformed(e.to_string()))
    }

    /// Verifies a token and returns the caller's identity.
    pub fn verify(&self, token: &str) -> Result<(Uuid, String), TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::Malformed(err.to_string()),
                _ => TokenError::Invalid,
            },
        )?;
        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| TokenError::Malformed("subject is not a UUID".to_string()))?;
        Ok((user_id, data.claims.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> TokenAuthenticator {
        TokenAuthenticator::new("test-secret", 24)
    }

    #[test]
    fn issued_tokens_verify() {
        let auth = authenticator();
        let user_id = Uuid::new_v4();
        let token = auth.issue(user_id, "jo@example.com").unwrap();
        let (verified_id, email) = auth.verify(&token).unwrap();
        assert_eq!(verified_id, user_id);
        assert_eq!(email, "jo@example.com");
    }

    #[test]
    fn expired_tokens_are_reported_as_expired() {
        let auth = authenticator();
        let token = auth
            .issue_with_expiry(Uuid::new_v4(), "jo@example.com", Duration::hours(-2))
            .unwrap();
        assert_eq!(auth.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = authenticator()
            .issue(Uuid::new_v4(), "jo@example.com")
            .unwrap();
        let other = TokenAuthenticator::new("different-secret", 24);
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_malformed() {
        let auth = authenticator();
        assert!(matches!(
            auth.verify("not-a-token"),
            Err(TokenError::Malformed(_))
        ));
    }
}
