use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ContactMethod, ProjectId},
    order::OrderSubmission,
};

/// Body accepted by the inbound submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderRequest {
    pub project_id: ProjectId,
    pub project_title: String,
    pub name: String,
    pub contact_method: ContactMethod,
    pub contact: String,
    pub quantity: u32,
    #[serde(default)]
    pub customization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SubmitOrderRequest {
    /// Builds the submission record, stamping `received_at` when the client sent no timestamp.
    pub fn into_submission(self, received_at: DateTime<Utc>) -> OrderSubmission {
        OrderSubmission {
            project_id: self.project_id,
            project_title: self.project_title.trim().to_string(),
            name: self.name.trim().to_string(),
            contact_method: self.contact_method,
            contact: self.contact.trim().to_string(),
            quantity: self.quantity,
            customization: self.customization.trim().to_string(),
            timestamp: self.timestamp.unwrap_or(received_at),
        }
    }
}

impl From<&OrderSubmission> for SubmitOrderRequest {
    fn from(value: &OrderSubmission) -> Self {
        Self {
            project_id: value.project_id,
            project_title: value.project_title.clone(),
            name: value.name.clone(),
            contact_method: value.contact_method,
            contact: value.contact.clone(),
            quantity: value.quantity,
            customization: value.customization.clone(),
            timestamp: Some(value.timestamp),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOrderResponse {
    pub success: bool,
}

/// Push request understood by the messaging API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessageRequest {
    pub to: String,
    pub messages: Vec<PushMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    Text { text: String },
}
