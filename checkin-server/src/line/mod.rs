//! LINE integration
//!
//! - [`Messenger`]: push messages to a LINE user (Messaging API)
//! - [`IdentityProvider`]: resolve a login code / ID token to a LINE identity
//! - [`messages`]: message builders for every notification the service sends

pub mod login;
pub mod messages;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use login::{IdentityProvider, LineIdentity, LineLogin, LoginCredential};

const PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";

/// A single LINE message object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LineMessage {
    Text {
        text: String,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: serde_json::Value,
    },
}

#[derive(Debug, Error)]
pub enum LineError {
    #[error("LINE request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LINE API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Outbound push channel
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn push(&self, to: &str, messages: &[LineMessage]) -> Result<(), LineError>;
}

/// Outcome of a bulk send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkResult {
    pub success: usize,
    pub failure: usize,
}

/// Send the same messages to every recipient, one at a time.
///
/// A failed recipient is logged and counted; it never stops the loop.
pub async fn send_bulk(
    messenger: &dyn Messenger,
    recipients: &[String],
    messages: &[LineMessage],
) -> BulkResult {
    let mut result = BulkResult::default();
    for to in recipients {
        match messenger.push(to, messages).await {
            Ok(()) => result.success += 1,
            Err(e) => {
                tracing::warn!(recipient = %to, error = %e, "LINE push failed");
                result.failure += 1;
            }
        }
    }
    result
}

/// LINE Messaging API client
pub struct LineMessenger {
    client: reqwest::Client,
    access_token: String,
}

impl LineMessenger {
    pub fn new(client: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self {
            client,
            access_token: access_token.into(),
        }
    }
}

#[derive(Serialize)]
struct PushBody<'a> {
    to: &'a str,
    messages: &'a [LineMessage],
}

#[async_trait]
impl Messenger for LineMessenger {
    async fn push(&self, to: &str, messages: &[LineMessage]) -> Result<(), LineError> {
        if self.access_token.is_empty() {
            tracing::warn!(recipient = %to, "LINE_CHANNEL_ACCESS_TOKEN not set, skipping push");
            return Ok(());
        }

        let resp = self
            .client
            .post(PUSH_ENDPOINT)
            .bearer_auth(&self.access_token)
            .json(&PushBody { to, messages })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(recipient = %to, "LINE push sent");
        Ok(())
    }
}
