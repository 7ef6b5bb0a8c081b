pub mod notify;
pub mod validation;
pub mod workflow;

pub use notify::{Notification, NotificationDispatcher, NotificationLevel};
pub use validation::{
    requires_evidence, validate_create, validate_edit, ValidationFailures, ValidationResult,
    EVIDENCE_FILE_REQUIRED,
};
pub use workflow::{
    CreateFailure, CreateOutcome, DeleteOutcome, EditFailure, EditOutcome, EditPhase,
    PaymentWorkflow,
};
