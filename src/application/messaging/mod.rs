mod event_listener;
mod publisher;
mod selector;

pub use event_listener::{EventListener, log_loan_event};
pub use publisher::{LoanPublisher, PublishError, PublishOutcome};
pub use selector::{TransportMode, TransportSelector};
