//! LINE Login: authorization-code exchange and ID-token verification

use async_trait::async_trait;
use serde::Deserialize;

use super::LineError;

const TOKEN_ENDPOINT: &str = "https://api.line.me/oauth2/v2.1/token";
const VERIFY_ENDPOINT: &str = "https://api.line.me/oauth2/v2.1/verify";

/// What the frontend handed us after the LINE redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginCredential {
    /// Authorization code, exchanged server-side for an ID token
    Code(String),
    /// ID token obtained by the frontend (LIFF)
    IdToken(String),
}

/// Verified LINE identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIdentity {
    pub line_id: String,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the provider rejected the credential
    async fn verify(&self, credential: &LoginCredential) -> Result<Option<LineIdentity>, LineError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct VerifyResponse {
    sub: Option<String>,
    name: Option<String>,
}

/// LINE Login channel client
pub struct LineLogin {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl LineLogin {
    pub fn new(
        client: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<Option<String>, LineError> {
        let resp = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if resp.status().is_client_error() {
            tracing::debug!(status = %resp.status(), "LINE rejected authorization code");
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LineError::Api { status, body });
        }

        let token: TokenResponse = resp.json().await?;
        Ok(token.id_token)
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<Option<LineIdentity>, LineError> {
        let resp = self
            .client
            .post(VERIFY_ENDPOINT)
            .form(&[("id_token", id_token), ("client_id", self.client_id.as_str())])
            .send()
            .await?;

        if resp.status().is_client_error() {
            tracing::debug!(status = %resp.status(), "LINE rejected ID token");
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LineError::Api { status, body });
        }

        let verified: VerifyResponse = resp.json().await?;
        Ok(verified.sub.filter(|s| !s.is_empty()).map(|line_id| LineIdentity {
            line_id,
            display_name: verified.name.filter(|n| !n.is_empty()),
        }))
    }
}

#[async_trait]
impl IdentityProvider for LineLogin {
    async fn verify(
        &self,
        credential: &LoginCredential,
    ) -> Result<Option<LineIdentity>, LineError> {
        match credential {
            LoginCredential::IdToken(token) => self.verify_id_token(token).await,
            LoginCredential::Code(code) => match self.exchange_code(code).await? {
                Some(id_token) => self.verify_id_token(&id_token).await,
                None => Ok(None),
            },
        }
    }
}
