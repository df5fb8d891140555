//! Google service-account authentication
//!
//! Signs an RS256 assertion for the configured service account and trades it
//! for a short-lived access token. Tokens are fetched per request.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::GoogleError;

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_READONLY: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const DOCS_READONLY: &str = "https://www.googleapis.com/auth/documents.readonly";

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct ServiceAccount {
    email: String,
    private_key: String,
}

impl ServiceAccount {
    /// `None` when either the account email or the key is missing.
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(Self {
            email: config.google_service_account_email.clone()?,
            private_key: config.google_private_key.clone()?,
        })
    }

    fn assertion(&self, scopes: &[&str]) -> Result<String, GoogleError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.email,
            scope: scopes.join(" "),
            aud: TOKEN_URL,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }

    /// Exchange a signed assertion for an access token.
    pub async fn access_token(
        &self,
        client: &reqwest::Client,
        scopes: &[&str],
    ) -> Result<String, GoogleError> {
        let assertion = self.assertion(scopes)?;
        debug!(account = %self.email, "requesting Google access token");

        let response = client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

/// Fail with the upstream status and body on a non-2xx response.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GoogleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(GoogleError::Status {
        status: status.as_u16(),
        body: response.text().await.unwrap_or_default(),
    })
}
