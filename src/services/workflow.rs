use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::client::PaymentsGateway;
use crate::error::GatewayError;
use crate::models::{
    CreateForm, EditFormSnapshot, EvidenceFile, PaymentRecord, QueryDescriptor,
};
use crate::services::notify::NotificationDispatcher;
use crate::services::validation::{
    validate_create, validate_edit, ValidationFailures, ValidationResult,
};

/// Progress of the active edit orchestration. Callers only ever trigger the
/// transition out of `Idle` by submitting; the rest is driven here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditPhase {
    #[default]
    Idle,
    Uploading,
    Updating,
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct EditSession {
    record_id: String,
    snapshot: EditFormSnapshot,
    phase: EditPhase,
}

#[derive(Debug)]
pub enum EditOutcome {
    Updated(PaymentRecord),
    Failed(EditFailure),
}

#[derive(Debug)]
pub enum EditFailure {
    NoActiveSession,
    Validation(ValidationFailures),
    Upload(GatewayError),
    Update(GatewayError),
}

#[derive(Debug)]
pub enum CreateOutcome {
    Created(String),
    Failed(CreateFailure),
}

#[derive(Debug)]
pub enum CreateFailure {
    Validation(ValidationFailures),
    Gateway(GatewayError),
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    Failed(GatewayError),
}

/// Sequences the payment flows against the gateway: the two-phase edit
/// (conditional evidence upload feeding the update patch), single-phase
/// create and delete, and the list refresh that follows every success.
///
/// Owns the single active edit session and the single active query
/// descriptor. Separate orchestrations are independent; within one
/// `submit_edit` the update is never issued before the upload's outcome is
/// observed.
pub struct PaymentWorkflow {
    gateway: Arc<dyn PaymentsGateway>,
    notifier: Arc<NotificationDispatcher>,
    query: Mutex<QueryDescriptor>,
    listing: Mutex<Vec<PaymentRecord>>,
    edit: Mutex<Option<EditSession>>,
}

impl PaymentWorkflow {
    pub fn new(
        gateway: Arc<dyn PaymentsGateway>,
        notifier: Arc<NotificationDispatcher>,
        initial_query: QueryDescriptor,
    ) -> Self {
        Self {
            gateway,
            notifier,
            query: Mutex::new(initial_query),
            listing: Mutex::new(Vec::new()),
            edit: Mutex::new(None),
        }
    }

    /// Re-derive the displayed set from the gateway using the active
    /// descriptor. There is no local patching of rows; this is the only way
    /// the listing changes.
    pub async fn refresh(&self) -> Result<Vec<PaymentRecord>, GatewayError> {
        let query = self.query.lock().await.clone();
        let payments = self.gateway.list(&query).await?;
        *self.listing.lock().await = payments.clone();
        Ok(payments)
    }

    /// Replace the active descriptor (page turn, new search text, filter
    /// change) and re-issue the fetch.
    pub async fn apply_query(
        &self,
        query: QueryDescriptor,
    ) -> Result<Vec<PaymentRecord>, GatewayError> {
        *self.query.lock().await = query;
        self.refresh().await
    }

    pub async fn active_query(&self) -> QueryDescriptor {
        self.query.lock().await.clone()
    }

    pub async fn current_listing(&self) -> Vec<PaymentRecord> {
        self.listing.lock().await.clone()
    }

    /// Open an edit session seeded from the selected record. Replaces any
    /// session already open.
    pub async fn open_edit(&self, record: &PaymentRecord) {
        let session = EditSession {
            record_id: record.id.clone(),
            snapshot: EditFormSnapshot::from_record(record),
            phase: EditPhase::Idle,
        };
        *self.edit.lock().await = Some(session);
    }

    /// Discard the active session (dialog dismissed without submitting).
    pub async fn close_edit(&self) {
        *self.edit.lock().await = None;
    }

    /// Mutate the active snapshot (caller typed into the form). Returns
    /// false when no session is open.
    pub async fn update_edit(&self, apply: impl FnOnce(&mut EditFormSnapshot)) -> bool {
        let mut edit = self.edit.lock().await;
        match edit.as_mut() {
            Some(session) => {
                apply(&mut session.snapshot);
                true
            }
            None => false,
        }
    }

    pub async fn stage_evidence(&self, file: EvidenceFile) -> bool {
        self.update_edit(|snapshot| snapshot.evidence_file = Some(file))
            .await
    }

    pub async fn edit_snapshot(&self) -> Option<EditFormSnapshot> {
        self.edit.lock().await.as_ref().map(|s| s.snapshot.clone())
    }

    pub async fn edit_phase(&self) -> EditPhase {
        self.edit
            .lock()
            .await
            .as_ref()
            .map(|s| s.phase)
            .unwrap_or_default()
    }

    /// Submit the active edit session.
    ///
    /// Phase A uploads staged evidence and folds the generated reference
    /// into the snapshot; Phase B sends the restricted patch built from the
    /// post-upload snapshot. A failure at either phase aborts the rest and
    /// keeps the session open for retry; after a successful upload the
    /// staged bytes are consumed, so a retry goes straight to the update.
    pub async fn submit_edit(&self) -> EditOutcome {
        let op_id = Uuid::new_v4();
        let mut edit = self.edit.lock().await;
        let Some(session) = edit.as_mut() else {
            self.notifier.error("No payment is being edited");
            return EditOutcome::Failed(EditFailure::NoActiveSession);
        };

        if let ValidationResult::Invalid(failures) = validate_edit(&session.snapshot) {
            session.phase = EditPhase::Failed;
            self.notifier
                .error(format!("Payment update blocked: {}", failures));
            return EditOutcome::Failed(EditFailure::Validation(failures));
        }

        // Phase A: upload staged evidence before anything else goes out.
        if let Some(file) = session.snapshot.evidence_file.take() {
            session.phase = EditPhase::Uploading;
            tracing::info!(
                %op_id,
                record_id = %session.record_id,
                filename = %file.filename,
                "Uploading evidence"
            );
            match self
                .gateway
                .upload_evidence(&session.record_id, file.clone())
                .await
            {
                Ok(uploaded) => {
                    // The fresh reference overwrites any prior one; the
                    // staged bytes stay consumed.
                    session.snapshot.evidence_file_id = Some(uploaded.evidence_file_id);
                }
                Err(err) => {
                    session.snapshot.evidence_file = Some(file);
                    session.phase = EditPhase::Failed;
                    self.notifier
                        .error(format!("Evidence upload failed: {}", err));
                    return EditOutcome::Failed(EditFailure::Upload(err));
                }
            }
        }

        // Phase B: the patch is built from the post-upload snapshot.
        session.phase = EditPhase::Updating;
        let Some(patch) = session.snapshot.update_payload() else {
            session.phase = EditPhase::Failed;
            let failures = ValidationFailures::single("form", "incomplete snapshot");
            self.notifier.error("Payment update blocked: incomplete form");
            return EditOutcome::Failed(EditFailure::Validation(failures));
        };

        tracing::info!(%op_id, record_id = %session.record_id, "Committing payment update");
        match self.gateway.update(&session.record_id, &patch).await {
            Ok(updated) => {
                session.phase = EditPhase::Succeeded;
                *edit = None;
                drop(edit);
                self.notifier.success("Payment updated");
                if let Err(err) = self.refresh().await {
                    tracing::warn!(%op_id, "List refresh after update failed: {}", err);
                }
                EditOutcome::Updated(updated)
            }
            Err(err) => {
                // The uploaded reference stays on the snapshot, so a retry
                // does not re-upload.
                session.phase = EditPhase::Failed;
                self.notifier
                    .error(format!("Payment update failed: {}", err));
                EditOutcome::Failed(EditFailure::Update(err))
            }
        }
    }

    /// Single-phase create: validate, send, refresh. A structured rejection
    /// fans out one notification per offending field plus a summary.
    pub async fn submit_create(&self, form: CreateForm) -> CreateOutcome {
        let op_id = Uuid::new_v4();
        if let ValidationResult::Invalid(failures) = validate_create(&form) {
            self.notifier
                .error(format!("Payment creation blocked: {}", failures));
            return CreateOutcome::Failed(CreateFailure::Validation(failures));
        }
        let Some(payment) = form.create_payload() else {
            let failures = ValidationFailures::single("form", "incomplete form");
            self.notifier.error("Payment creation blocked: incomplete form");
            return CreateOutcome::Failed(CreateFailure::Validation(failures));
        };

        tracing::info!(%op_id, payee = %payment.payee_email, "Creating payment");
        match self.gateway.create(&payment).await {
            Ok(created) => {
                self.notifier.success("Payment created");
                if let Err(err) = self.refresh().await {
                    tracing::warn!(%op_id, "List refresh after create failed: {}", err);
                }
                CreateOutcome::Created(created.id)
            }
            Err(err) => {
                self.notifier.field_errors(err.field_errors());
                self.notifier
                    .error(format!("Payment creation failed: {}", err));
                CreateOutcome::Failed(CreateFailure::Gateway(err))
            }
        }
    }

    /// Single gateway call; the displayed set only changes through the
    /// refresh that follows a confirmed delete.
    pub async fn submit_delete(&self, record_id: &str) -> DeleteOutcome {
        let op_id = Uuid::new_v4();
        tracing::info!(%op_id, record_id = %record_id, "Deleting payment");
        match self.gateway.delete(record_id).await {
            Ok(()) => {
                self.notifier.success("Payment deleted");
                if let Err(err) = self.refresh().await {
                    tracing::warn!(%op_id, "List refresh after delete failed: {}", err);
                }
                DeleteOutcome::Deleted
            }
            Err(err) => {
                self.notifier
                    .error(format!("Payment delete failed: {}", err));
                DeleteOutcome::Failed(err)
            }
        }
    }

    pub fn evidence_download_location(&self, record_id: &str) -> String {
        self.gateway.evidence_download_location(record_id)
    }
}
