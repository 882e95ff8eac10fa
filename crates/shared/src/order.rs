//! Order draft, submission record, and the validation rules shared by the
//! client form and the inbound submission endpoint.

use std::{ops::RangeInclusive, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ContactMethod, ProjectId};

pub const QUANTITY_RANGE: RangeInclusive<u32> = 1..=10;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

pub fn is_email_shaped(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderField {
    Name,
    ContactMethod,
    Contact,
    Quantity,
    Customization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    #[error("value is required")]
    Required,
    #[error("not a valid email address")]
    InvalidEmail,
    #[error("quantity must be between 1 and 10")]
    QuantityOutOfRange,
}

impl FieldErrorKind {
    /// Translation key the presentation layer renders for this error.
    pub fn message_key(self) -> &'static str {
        match self {
            FieldErrorKind::Required => "order.required",
            FieldErrorKind::InvalidEmail => "order.invalidEmail",
            FieldErrorKind::QuantityOutOfRange => "order.invalidQuantity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{field:?}: {kind}")]
pub struct FieldError {
    pub field: OrderField,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(field: OrderField, kind: FieldErrorKind) -> Self {
        Self { field, kind }
    }

    /// Whether editing `changed` makes this error stale.
    pub fn cleared_by(&self, changed: OrderField) -> bool {
        self.field == changed
            || (changed == OrderField::ContactMethod && self.field == OrderField::Contact)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub name: String,
    pub contact_method: ContactMethod,
    pub contact: String,
    pub quantity: u32,
    #[serde(default)]
    pub customization: String,
}

impl Default for OrderDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            contact_method: ContactMethod::default(),
            contact: String::new(),
            quantity: *QUANTITY_RANGE.start(),
            customization: String::new(),
        }
    }
}

impl OrderDraft {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        validate_fields(&self.name, self.contact_method, &self.contact, self.quantity)
    }
}

/// Immutable record built at submit time. The same value goes to the
/// notification dispatcher and the fallback recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub project_id: ProjectId,
    pub project_title: String,
    pub name: String,
    pub contact_method: ContactMethod,
    pub contact: String,
    pub quantity: u32,
    #[serde(default)]
    pub customization: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderSubmission {
    pub fn from_draft(
        project_id: ProjectId,
        project_title: impl Into<String>,
        draft: &OrderDraft,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id,
            project_title: project_title.into(),
            name: draft.name.trim().to_string(),
            contact_method: draft.contact_method,
            contact: draft.contact.trim().to_string(),
            quantity: draft.quantity,
            customization: draft.customization.trim().to_string(),
            timestamp,
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        validate_fields(&self.name, self.contact_method, &self.contact, self.quantity)
    }

    pub fn customization(&self) -> Option<&str> {
        Some(self.customization.as_str()).filter(|text| !text.trim().is_empty())
    }
}

fn validate_fields(
    name: &str,
    contact_method: ContactMethod,
    contact: &str,
    quantity: u32,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push(FieldError::new(OrderField::Name, FieldErrorKind::Required));
    }

    let contact = contact.trim();
    if contact.is_empty() {
        errors.push(FieldError::new(OrderField::Contact, FieldErrorKind::Required));
    } else if contact_method == ContactMethod::Email && !is_email_shaped(contact) {
        errors.push(FieldError::new(
            OrderField::Contact,
            FieldErrorKind::InvalidEmail,
        ));
    }

    if !QUANTITY_RANGE.contains(&quantity) {
        errors.push(FieldError::new(
            OrderField::Quantity,
            FieldErrorKind::QuantityOutOfRange,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
#[path = "tests/order_tests.rs"]
mod tests;
