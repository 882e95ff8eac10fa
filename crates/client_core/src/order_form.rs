//! Order form state machine.
//!
//! `Idle -> Validating -> Submitting -> Success | Failed`. A successful
//! submission returns to `Idle` with a cleared draft after
//! [`AUTO_DISMISS_DELAY`]. The dispatcher result decides what the customer
//! sees; the fallback recorder always runs and its failures are only logged.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::Utc;
use notifier::NotificationDispatcher;
use shared::{
    catalog::Catalog,
    domain::{ContactMethod, ProjectId},
    locale::Locale,
    order::{FieldError, OrderDraft, OrderField, OrderSubmission},
};
use storage::FallbackRecorder;
use thiserror::Error;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

pub const AUTO_DISMISS_DELAY: Duration = Duration::from_millis(2500);
/// Generic message key shown for any dispatch failure.
pub const SUBMIT_ERROR_KEY: &str = "order.submitError";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Invalid(Vec<FieldError>),
    SubmissionFailed,
}

impl FailureReason {
    pub fn message_key(&self) -> &'static str {
        match self {
            FailureReason::Invalid(_) => "order.invalid",
            FailureReason::SubmissionFailed => SUBMIT_ERROR_KEY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Submitting,
    Success,
    Failed(FailureReason),
}

impl SubmissionState {
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            SubmissionState::Idle | SubmissionState::Validating | SubmissionState::Failed(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderFormError {
    #[error("project {0} is not in the catalog")]
    UnknownProject(ProjectId),
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("the form cannot be edited in its current state")]
    NotEditable,
    #[error("the form has been closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Name(String),
    ContactMethod(ContactMethod),
    Contact(String),
    Quantity(u32),
    Customization(String),
}

impl FieldUpdate {
    pub fn field(&self) -> OrderField {
        match self {
            FieldUpdate::Name(_) => OrderField::Name,
            FieldUpdate::ContactMethod(_) => OrderField::ContactMethod,
            FieldUpdate::Contact(_) => OrderField::Contact,
            FieldUpdate::Quantity(_) => OrderField::Quantity,
            FieldUpdate::Customization(_) => OrderField::Customization,
        }
    }

    fn apply(self, draft: &mut OrderDraft) {
        match self {
            FieldUpdate::Name(value) => draft.name = value,
            FieldUpdate::ContactMethod(value) => draft.contact_method = value,
            FieldUpdate::Contact(value) => draft.contact = value,
            FieldUpdate::Quantity(value) => draft.quantity = value,
            FieldUpdate::Customization(value) => draft.customization = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Delivered(OrderSubmission),
    Invalid(Vec<FieldError>),
    Failed,
    /// The form was closed while the dispatch was in flight.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderFormEvent {
    StateChanged(SubmissionState),
    DraftCleared,
    Closed,
}

struct FormState {
    state: SubmissionState,
    draft: OrderDraft,
    closed: bool,
    dismiss_task: Option<JoinHandle<()>>,
}

/// One open order form, scoped to a single project.
pub struct OrderFormController {
    project_id: ProjectId,
    project_title: String,
    dispatcher: Arc<dyn NotificationDispatcher>,
    recorder: Arc<dyn FallbackRecorder>,
    dismiss_delay: Duration,
    inner: Arc<Mutex<FormState>>,
    events: broadcast::Sender<OrderFormEvent>,
}

impl OrderFormController {
    /// Opens a form for `project_id`; the title is captured in `locale`.
    pub fn open(
        catalog: &Catalog,
        project_id: ProjectId,
        locale: Locale,
        dispatcher: Arc<dyn NotificationDispatcher>,
        recorder: Arc<dyn FallbackRecorder>,
    ) -> Result<Self, OrderFormError> {
        let project = catalog
            .by_id(project_id)
            .ok_or(OrderFormError::UnknownProject(project_id))?;
        let (events, _) = broadcast::channel(64);
        Ok(Self {
            project_id,
            project_title: project.title.resolve(locale).to_string(),
            dispatcher,
            recorder,
            dismiss_delay: AUTO_DISMISS_DELAY,
            inner: Arc::new(Mutex::new(FormState {
                state: SubmissionState::Idle,
                draft: OrderDraft::default(),
                closed: false,
                dismiss_task: None,
            })),
            events,
        })
    }

    pub fn with_dismiss_delay(mut self, delay: Duration) -> Self {
        self.dismiss_delay = delay;
        self
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn project_title(&self) -> &str {
        &self.project_title
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderFormEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SubmissionState {
        lock(&self.inner).state.clone()
    }

    pub fn draft(&self) -> OrderDraft {
        lock(&self.inner).draft.clone()
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.inner).closed
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        match &lock(&self.inner).state {
            SubmissionState::Failed(FailureReason::Invalid(errors)) => errors.clone(),
            _ => Vec::new(),
        }
    }

    pub fn update_field(&self, update: FieldUpdate) -> Result<(), OrderFormError> {
        let mut inner = lock(&self.inner);
        if inner.closed {
            return Err(OrderFormError::Closed);
        }
        if !inner.state.is_editable() {
            return Err(OrderFormError::NotEditable);
        }

        let field = update.field();
        update.apply(&mut inner.draft);

        if let SubmissionState::Failed(FailureReason::Invalid(errors)) = &inner.state {
            let remaining: Vec<FieldError> = errors
                .iter()
                .filter(|error| !error.cleared_by(field))
                .copied()
                .collect();
            if remaining.len() != errors.len() {
                let next = if remaining.is_empty() {
                    SubmissionState::Idle
                } else {
                    SubmissionState::Failed(FailureReason::Invalid(remaining))
                };
                self.transition(&mut inner, next);
            }
        }
        Ok(())
    }

    /// Validates the draft and, when valid, dispatches it and records it locally.
    pub async fn submit(&self) -> Result<SubmitOutcome, OrderFormError> {
        let submission = {
            let mut inner = lock(&self.inner);
            if inner.closed {
                return Err(OrderFormError::Closed);
            }
            match inner.state {
                SubmissionState::Submitting => return Err(OrderFormError::AlreadySubmitting),
                SubmissionState::Success => return Err(OrderFormError::NotEditable),
                _ => {}
            }

            self.transition(&mut inner, SubmissionState::Validating);
            if let Err(errors) = inner.draft.validate() {
                debug!(
                    project_id = %self.project_id,
                    errors = errors.len(),
                    "order draft failed validation"
                );
                self.transition(
                    &mut inner,
                    SubmissionState::Failed(FailureReason::Invalid(errors.clone())),
                );
                return Ok(SubmitOutcome::Invalid(errors));
            }

            let submission = OrderSubmission::from_draft(
                self.project_id,
                self.project_title.as_str(),
                &inner.draft,
                Utc::now(),
            );
            self.transition(&mut inner, SubmissionState::Submitting);
            submission
        };

        let dispatched = self.dispatcher.dispatch(&submission).await;
        if let Err(err) = self.recorder.append(&submission).await {
            warn!(
                project_id = %self.project_id,
                error = %err,
                "failed to record order in local fallback log"
            );
        }

        let mut inner = lock(&self.inner);
        if inner.closed {
            debug!(project_id = %self.project_id, "discarding result for closed order form");
            return Ok(SubmitOutcome::Discarded);
        }

        match dispatched {
            Ok(()) => {
                info!(project_id = %self.project_id, "order submitted");
                self.transition(&mut inner, SubmissionState::Success);
                inner.dismiss_task = Some(self.spawn_auto_dismiss());
                Ok(SubmitOutcome::Delivered(submission))
            }
            Err(err) => {
                error!(
                    project_id = %self.project_id,
                    error = %err,
                    details = %err.details(),
                    "order notification failed"
                );
                self.transition(
                    &mut inner,
                    SubmissionState::Failed(FailureReason::SubmissionFailed),
                );
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    /// Tears the form down. Safe to call more than once.
    pub fn close(&self) {
        let mut inner = lock(&self.inner);
        if inner.closed {
            return;
        }
        inner.closed = true;
        if let Some(task) = inner.dismiss_task.take() {
            task.abort();
        }
        let _ = self.events.send(OrderFormEvent::Closed);
    }

    fn transition(&self, inner: &mut FormState, next: SubmissionState) {
        if inner.state == next {
            return;
        }
        inner.state = next.clone();
        let _ = self.events.send(OrderFormEvent::StateChanged(next));
    }

    fn spawn_auto_dismiss(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        let delay = self.dismiss_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = lock(&inner);
            if inner.closed || inner.state != SubmissionState::Success {
                return;
            }
            inner.state = SubmissionState::Idle;
            inner.draft = OrderDraft::default();
            inner.dismiss_task = None;
            let _ = events.send(OrderFormEvent::StateChanged(SubmissionState::Idle));
            let _ = events.send(OrderFormEvent::DraftCleared);
        })
    }
}

impl Drop for OrderFormController {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock(state: &Mutex<FormState>) -> MutexGuard<'_, FormState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/order_form_tests.rs"]
mod tests;
