//! services/api/src/adapters/google.rs
//!
//! Google OAuth code-exchange adapter implementing the `IdentityProvider`
//! port. Constructed explicitly in `main` and injected through the
//! application state; nothing here registers any process-wide strategy.

use async_trait::async_trait;
use nearserve_core::ports::{IdentityProfile, IdentityProvider, PortError, PortResult};
use serde::Deserialize;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

pub struct GoogleIdentity {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct UserInfoResponse {
    id: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleIdentity {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            client_secret,
            redirect_uri,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    async fn exchange_code(&self, code: &str) -> PortResult<IdentityProfile> {
        let token: TokenResponse = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("token exchange failed: {e}")))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("token response unreadable: {e}")))?;

        let access_token = token
            .access_token
            .ok_or_else(|| PortError::Unauthorized("Failed to get access token".to_string()))?;

        let info: UserInfoResponse = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("userinfo request failed: {e}")))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("userinfo response unreadable: {e}")))?;

        let email = info
            .email
            .ok_or_else(|| PortError::Validation("No email provided".to_string()))?;

        Ok(IdentityProfile {
            subject: info.id,
            email,
            name: info.name,
            avatar: info.picture,
        })
    }
}
