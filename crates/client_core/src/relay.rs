use std::time::Duration;

use async_trait::async_trait;
use notifier::{DispatchError, NotificationDispatcher, DEFAULT_DISPATCH_TIMEOUT};
use reqwest::Client;
use shared::{
    order::OrderSubmission,
    protocol::{SubmitOrderRequest, SubmitOrderResponse},
};
use tracing::{error, info};

pub const ORDERS_ROUTE: &str = "/api/orders";

/// Forwards submissions to the storefront service, which owns the push credentials.
pub struct RelayDispatcher {
    http: Client,
    endpoint: String,
}

impl RelayDispatcher {
    pub fn new(server_url: &str) -> Result<Self, reqwest::Error> {
        Self::with_timeout(server_url, DEFAULT_DISPATCH_TIMEOUT)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}{ORDERS_ROUTE}", server_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NotificationDispatcher for RelayDispatcher {
    async fn dispatch(&self, submission: &OrderSubmission) -> Result<(), DispatchError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&SubmitOrderRequest::from(submission))
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, endpoint = %self.endpoint, "order relay request failed");
                DispatchError::from(err)
            })?;

        let status = response.status();
        let body = response.text().await?;
        let details = serde_json::from_str::<serde_json::Value>(&body)
            .unwrap_or(serde_json::Value::String(body));

        if status.is_success() {
            let accepted = serde_json::from_value::<SubmitOrderResponse>(details.clone())
                .is_ok_and(|response| response.success);
            if accepted {
                info!(project_id = %submission.project_id, "order relayed");
                return Ok(());
            }
            error!(status = status.as_u16(), %details, "malformed order relay response");
            return Err(DispatchError::UpstreamRejected {
                status: status.as_u16(),
                message: "malformed response".into(),
                details,
            });
        }

        let message = details
            .get("error")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        error!(status = status.as_u16(), %message, %details, "order relay rejected");
        Err(DispatchError::UpstreamRejected {
            status: status.as_u16(),
            message,
            details,
        })
    }
}

#[cfg(test)]
#[path = "tests/relay_tests.rs"]
mod tests;
