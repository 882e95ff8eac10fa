use std::sync::Arc;

use chrono::{DateTime, Utc};
use notifier::{DispatchError, NotificationDispatcher};
use shared::{
    catalog::Catalog,
    domain::ProjectView,
    error::{ApiError, ErrorCode},
    locale::Locale,
    order::FieldError,
    protocol::{SubmitOrderRequest, SubmitOrderResponse},
};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ApiContext {
    pub catalog: Arc<Catalog>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
}

pub fn list_projects(ctx: &ApiContext, locale: Locale) -> Vec<ProjectView> {
    ctx.catalog.views(locale)
}

pub fn project_by_slug(
    ctx: &ApiContext,
    slug: &str,
    locale: Locale,
) -> Result<ProjectView, ApiError> {
    ctx.catalog
        .by_slug(slug)
        .map(|project| project.localized(locale))
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "project not found"))
}

/// Validates an inbound order and hands it to the dispatcher exactly once.
pub async fn submit_order(
    ctx: &ApiContext,
    request: SubmitOrderRequest,
    received_at: DateTime<Utc>,
) -> Result<SubmitOrderResponse, ApiError> {
    let mut submission = request.into_submission(received_at);

    submission.validate().map_err(|errors| {
        warn!(
            project_id = %submission.project_id,
            errors = errors.len(),
            "rejecting invalid order submission"
        );
        ApiError::new(ErrorCode::Validation, "invalid order submission")
            .with_details(field_error_details(&errors))
    })?;

    let project = ctx.catalog.by_id(submission.project_id).ok_or_else(|| {
        warn!(project_id = %submission.project_id, "order references unknown project");
        ApiError::new(ErrorCode::Validation, "unknown project")
            .with_details(serde_json::json!({ "projectId": submission.project_id }))
    })?;
    if submission.project_title.is_empty() {
        submission.project_title = project.title.resolve(Locale::DEFAULT).to_string();
    }

    ctx.dispatcher
        .dispatch(&submission)
        .await
        .map_err(|err| dispatch_failure(&err))?;

    info!(
        project_id = %submission.project_id,
        contact_method = %submission.contact_method,
        quantity = submission.quantity,
        "order notification sent"
    );
    Ok(SubmitOrderResponse { success: true })
}

fn dispatch_failure(err: &DispatchError) -> ApiError {
    error!(error = %err, details = %err.details(), "order notification failed");
    let (code, message) = match err {
        DispatchError::NotConfigured => (ErrorCode::NotConfigured, "LINE configuration missing"),
        DispatchError::Transport(_) => (ErrorCode::Upstream, "failed to reach LINE API"),
        DispatchError::UpstreamRejected { .. } => {
            (ErrorCode::Upstream, "failed to send LINE message")
        }
    };
    ApiError::new(code, message).with_details(err.details())
}

fn field_error_details(errors: &[FieldError]) -> serde_json::Value {
    errors
        .iter()
        .map(|error| {
            serde_json::json!({
                "field": error.field,
                "kind": error.kind,
                "messageKey": error.kind.message_key(),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
