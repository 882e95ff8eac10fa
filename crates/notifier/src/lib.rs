//! Order notifications delivered through a messaging push API.
//!
//! A dispatch is a single, bounded-time delivery attempt. Nothing here
//! retries: a manual retry is the customer submitting the form again.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use reqwest::Client;
use shared::{
    order::OrderSubmission,
    protocol::{PushMessage, PushMessageRequest},
};
use thiserror::Error;
use tracing::{error, info, warn};

pub const LINE_PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Taipei local time, used when rendering the submission instant.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;
const NO_CUSTOMIZATION: &str = "無";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("push credentials are not configured")]
    NotConfigured,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream rejected notification with HTTP {status}: {message}")]
    UpstreamRejected {
        status: u16,
        message: String,
        details: serde_json::Value,
    },
}

impl DispatchError {
    /// Diagnostic payload suitable for logs and operator-facing error bodies.
    pub fn details(&self) -> serde_json::Value {
        match self {
            DispatchError::NotConfigured => {
                serde_json::Value::String("missing channel access token or recipient id".into())
            }
            DispatchError::Transport(message) => serde_json::Value::String(message.clone()),
            DispatchError::UpstreamRejected { details, .. } => details.clone(),
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            DispatchError::Transport(format!("request timed out: {value}"))
        } else {
            DispatchError::Transport(value.to_string())
        }
    }
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, submission: &OrderSubmission) -> Result<(), DispatchError>;
}

pub struct MissingNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for MissingNotificationDispatcher {
    async fn dispatch(&self, _submission: &OrderSubmission) -> Result<(), DispatchError> {
        Err(DispatchError::NotConfigured)
    }
}

/// Pre-provisioned credential pair for the push API.
#[derive(Clone)]
pub struct PushCredentials {
    pub channel_access_token: String,
    pub recipient_id: String,
}

impl PushCredentials {
    /// Returns `None` unless both parts are present and non-blank.
    pub fn from_parts(
        channel_access_token: Option<String>,
        recipient_id: Option<String>,
    ) -> Option<Self> {
        let channel_access_token = channel_access_token.filter(|v| !v.trim().is_empty())?;
        let recipient_id = recipient_id.filter(|v| !v.trim().is_empty())?;
        Some(Self {
            channel_access_token,
            recipient_id,
        })
    }
}

impl std::fmt::Debug for PushCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushCredentials")
            .field("channel_access_token", &"<redacted>")
            .field("recipient_id", &self.recipient_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub endpoint: String,
    pub credentials: Option<PushCredentials>,
    pub timeout: Duration,
    pub utc_offset: FixedOffset,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: LINE_PUSH_ENDPOINT.into(),
            credentials: None,
            timeout: DEFAULT_DISPATCH_TIMEOUT,
            utc_offset: utc_offset_from_hours(DEFAULT_UTC_OFFSET_HOURS),
        }
    }
}

/// Out-of-range offsets fall back to UTC.
pub fn utc_offset_from_hours(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

pub struct PushDispatcher {
    client: Client,
    config: PushConfig,
}

impl PushDispatcher {
    pub fn new(config: PushConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.credentials.is_some()
    }

    pub fn compose_message(&self, submission: &OrderSubmission) -> String {
        compose_message(submission, self.config.utc_offset)
    }
}

#[async_trait]
impl NotificationDispatcher for PushDispatcher {
    async fn dispatch(&self, submission: &OrderSubmission) -> Result<(), DispatchError> {
        let Some(credentials) = &self.config.credentials else {
            warn!("push credentials missing; refusing to dispatch order notification");
            return Err(DispatchError::NotConfigured);
        };

        let payload = PushMessageRequest {
            to: credentials.recipient_id.clone(),
            messages: vec![PushMessage::Text {
                text: self.compose_message(submission),
            }],
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&credentials.channel_access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, endpoint = %self.config.endpoint, "push request failed");
                DispatchError::from(err)
            })?;

        let status = response.status();
        if status.is_success() {
            info!(
                project_id = %submission.project_id,
                status = status.as_u16(),
                "order notification delivered"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let details = serde_json::from_str::<serde_json::Value>(&body)
            .unwrap_or(serde_json::Value::String(body));
        let message = details
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        error!(
            status = status.as_u16(),
            %message,
            %details,
            "push API rejected order notification"
        );
        Err(DispatchError::UpstreamRejected {
            status: status.as_u16(),
            message,
            details,
        })
    }
}

/// Renders the order as one human-readable text message.
pub fn compose_message(submission: &OrderSubmission, utc_offset: FixedOffset) -> String {
    let submitted_at = submission
        .timestamp
        .with_timezone(&utc_offset)
        .format("%Y/%m/%d %H:%M:%S");
    format!(
        "🎨 新訂單詢問！\n\
         \n\
         📦 作品：{title}\n\
         👤 姓名：{name}\n\
         📞 聯絡方式：{method}\n\
         📱 聯絡資訊：{contact}\n\
         🔢 數量：{quantity}\n\
         ✨ 客製化需求：{customization}\n\
         \n\
         ⏰ 時間：{submitted_at}",
        title = submission.project_title,
        name = submission.name,
        method = submission.contact_method.label(),
        contact = submission.contact,
        quantity = submission.quantity,
        customization = submission.customization().unwrap_or(NO_CUSTOMIZATION),
    )
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
