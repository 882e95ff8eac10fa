//! Client-side controllers for browsing the catalog and placing an order.
//!
//! Both controllers are plain state machines that publish every transition
//! on a `tokio::sync::broadcast` channel; rendering is left to whoever
//! subscribes.

pub mod carousel;
pub mod order_form;
pub mod relay;

pub use carousel::{CarouselController, CarouselError, CarouselEvent, CarouselSelection};
pub use order_form::{
    FailureReason, FieldUpdate, OrderFormController, OrderFormError, OrderFormEvent,
    SubmissionState, SubmitOutcome, AUTO_DISMISS_DELAY, SUBMIT_ERROR_KEY,
};
pub use relay::RelayDispatcher;
