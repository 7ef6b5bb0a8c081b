use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{CreateForm, EditFormSnapshot, PaymentStatus};

/// Whole-form failure key for the evidence constraint.
pub const EVIDENCE_FILE_REQUIRED: &str = "evidenceFileRequired";

/// Cross-field rule: a payment marked completed must carry proof. Evaluated
/// against the current snapshot only, so moving the status away from
/// `completed` clears the requirement no matter what it was before.
pub fn requires_evidence(status: PaymentStatus) -> bool {
    status == PaymentStatus::Completed
}

/// Named validation failures, keyed by field (or by a whole-form key such as
/// [`EVIDENCE_FILE_REQUIRED`]). Rules run independently; every violation is
/// collected, nothing short-circuits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationFailures {
    failures: BTreeMap<String, String>,
}

impl ValidationFailures {
    pub fn single(key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut failures = Self::default();
        failures.push(key, message);
        failures
    }

    fn push(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.failures.insert(key.into(), message.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.failures.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.failures.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, message) in &self.failures {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", key, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid,
    Invalid(ValidationFailures),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    fn from_failures(failures: ValidationFailures) -> Self {
        if failures.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(failures)
        }
    }
}

fn email_shape() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

// E.164: leading +, then 2 to 15 digits.
fn phone_shape() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+[1-9]\d{1,14}$").unwrap())
}

fn has_two_decimals_at_most(value: f64) -> bool {
    let scaled = value * 100.0;
    (scaled - scaled.round()).abs() < 1e-9
}

struct Checks {
    failures: ValidationFailures,
}

impl Checks {
    fn new() -> Self {
        Self {
            failures: ValidationFailures::default(),
        }
    }

    fn require_text(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.failures.push(key, "field required");
        }
    }

    fn require_shape(&mut self, key: &str, value: &str, shape: &Regex, message: &str) {
        if !value.is_empty() && !shape.is_match(value) {
            self.failures.push(key, message);
        }
    }

    fn require_length(&mut self, key: &str, value: &str, len: usize, message: &str) {
        if !value.is_empty() && value.chars().count() != len {
            self.failures.push(key, message);
        }
    }

    fn require_percent(&mut self, key: &str, value: Option<f64>) {
        if let Some(v) = value {
            if !(0.0..=100.0).contains(&v) {
                self.failures.push(key, "must be between 0 and 100");
            } else if !has_two_decimals_at_most(v) {
                self.failures.push(key, "at most 2 decimal places");
            }
        }
    }
}

/// Create-path validation: every required field of the record schema,
/// plus the shape rules the gateway enforces (so the caller hears about
/// them before any network round trip).
pub fn validate_create(form: &CreateForm) -> ValidationResult {
    let mut checks = Checks::new();

    checks.require_text("payee_first_name", &form.payee_first_name);
    checks.require_text("payee_last_name", &form.payee_last_name);
    checks.require_text("payee_email", &form.payee_email);
    checks.require_shape(
        "payee_email",
        &form.payee_email,
        email_shape(),
        "must be a valid email address",
    );
    checks.require_text("payee_phone_number", &form.payee_phone_number);
    checks.require_shape(
        "payee_phone_number",
        &form.payee_phone_number,
        phone_shape(),
        "must be E.164, e.g. +14165550100",
    );
    checks.require_text("payee_address_line_1", &form.payee_address_line_1);
    checks.require_text("payee_city", &form.payee_city);
    checks.require_text("payee_province_or_state", &form.payee_province_or_state);
    checks.require_text("payee_country", &form.payee_country);
    checks.require_length(
        "payee_country",
        &form.payee_country,
        2,
        "must be an ISO 3166-1 alpha-2 code",
    );
    checks.require_text("payee_postal_code", &form.payee_postal_code);
    checks.require_text("currency", &form.currency);
    checks.require_length("currency", &form.currency, 3, "must be an ISO 4217 code");

    if form.payee_due_date.is_none() {
        checks.failures.push("payee_due_date", "field required");
    }
    match form.due_amount {
        None => checks.failures.push("due_amount", "field required"),
        Some(amount) if amount < 0.0 => {
            checks.failures.push("due_amount", "must not be negative")
        }
        Some(_) => {}
    }
    checks.require_percent("discount_percent", form.discount_percent);
    checks.require_percent("tax_percent", form.tax_percent);

    ValidationResult::from_failures(checks.failures)
}

/// Edit-path validation: the three patch fields are required, the selected
/// status must be one a user may pick, and the evidence rule runs as a
/// whole-form constraint.
pub fn validate_edit(snapshot: &EditFormSnapshot) -> ValidationResult {
    let mut checks = Checks::new();

    if snapshot.payee_due_date.is_none() {
        checks.failures.push("payee_due_date", "field required");
    }
    match snapshot.due_amount {
        None => checks.failures.push("due_amount", "field required"),
        Some(amount) if amount < 0.0 => {
            checks.failures.push("due_amount", "must not be negative")
        }
        Some(_) => {}
    }
    match snapshot.payee_payment_status {
        None => checks.failures.push("payee_payment_status", "field required"),
        Some(status) if !status.user_selectable() => checks
            .failures
            .push("payee_payment_status", "overdue is derived, not selectable"),
        Some(status) => {
            if requires_evidence(status)
                && !snapshot.has_staged_evidence()
                && snapshot.evidence_file_id.is_none()
            {
                checks.failures.push(
                    EVIDENCE_FILE_REQUIRED,
                    "an evidence file is required for completed payments",
                );
            }
        }
    }

    ValidationResult::from_failures(checks.failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EvidenceFile;
    use chrono::NaiveDate;

    fn completed_snapshot() -> EditFormSnapshot {
        EditFormSnapshot {
            payee_due_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            due_amount: Some(100.0),
            payee_payment_status: Some(PaymentStatus::Completed),
            evidence_file: None,
            evidence_file_id: None,
        }
    }

    fn filled_create_form() -> CreateForm {
        CreateForm {
            payee_first_name: "Ada".into(),
            payee_last_name: "Smith".into(),
            payee_email: "ada@example.com".into(),
            payee_phone_number: "+14165550100".into(),
            payee_address_line_1: "12 King St".into(),
            payee_city: "Toronto".into(),
            payee_province_or_state: "ON".into(),
            payee_country: "CA".into(),
            payee_postal_code: "M5H 1A1".into(),
            payee_due_date: NaiveDate::from_ymd_opt(2025, 4, 15),
            due_amount: Some(250.0),
            ..CreateForm::default()
        }
    }

    #[test]
    fn evidence_is_required_only_for_completed() {
        assert!(requires_evidence(PaymentStatus::Completed));
        assert!(!requires_evidence(PaymentStatus::Pending));
        assert!(!requires_evidence(PaymentStatus::DueNow));
        assert!(!requires_evidence(PaymentStatus::Overdue));
    }

    #[test]
    fn completed_without_evidence_fails_the_whole_form() {
        let result = validate_edit(&completed_snapshot());
        match result {
            ValidationResult::Invalid(failures) => {
                assert!(failures.contains(EVIDENCE_FILE_REQUIRED));
            }
            ValidationResult::Valid => panic!("expected a failure"),
        }
    }

    #[test]
    fn staged_file_or_existing_reference_satisfies_the_rule() {
        let mut with_file = completed_snapshot();
        with_file.evidence_file = Some(EvidenceFile::new("receipt.pdf", vec![1, 2, 3]));
        assert!(validate_edit(&with_file).is_valid());

        let mut with_reference = completed_snapshot();
        with_reference.evidence_file_id = Some("ev-old".into());
        assert!(validate_edit(&with_reference).is_valid());
    }

    #[test]
    fn empty_staged_file_does_not_count_as_evidence() {
        let mut snapshot = completed_snapshot();
        snapshot.evidence_file = Some(EvidenceFile::new("empty.pdf", Vec::new()));
        match validate_edit(&snapshot) {
            ValidationResult::Invalid(failures) => {
                assert!(failures.contains(EVIDENCE_FILE_REQUIRED))
            }
            ValidationResult::Valid => panic!("expected a failure"),
        }
    }

    #[test]
    fn leaving_completed_clears_the_requirement() {
        let mut snapshot = completed_snapshot();
        snapshot.payee_payment_status = Some(PaymentStatus::Pending);
        assert!(validate_edit(&snapshot).is_valid());
    }

    #[test]
    fn edit_requires_the_patch_fields() {
        let snapshot = EditFormSnapshot::default();
        match validate_edit(&snapshot) {
            ValidationResult::Invalid(failures) => {
                assert!(failures.contains("payee_due_date"));
                assert!(failures.contains("due_amount"));
                assert!(failures.contains("payee_payment_status"));
            }
            ValidationResult::Valid => panic!("expected failures"),
        }
    }

    #[test]
    fn overdue_cannot_be_selected_on_edit() {
        let mut snapshot = completed_snapshot();
        snapshot.payee_payment_status = Some(PaymentStatus::Overdue);
        match validate_edit(&snapshot) {
            ValidationResult::Invalid(failures) => {
                assert!(failures.contains("payee_payment_status"))
            }
            ValidationResult::Valid => panic!("expected a failure"),
        }
    }

    #[test]
    fn create_accepts_a_complete_form() {
        assert!(validate_create(&filled_create_form()).is_valid());
    }

    #[test]
    fn create_with_missing_due_amount_fails() {
        let mut form = filled_create_form();
        form.due_amount = None;
        match validate_create(&form) {
            ValidationResult::Invalid(failures) => {
                assert!(failures.contains("due_amount"));
            }
            ValidationResult::Valid => panic!("expected a failure"),
        }
    }

    #[test]
    fn create_collects_every_violation_at_once() {
        let mut form = filled_create_form();
        form.payee_email = "not-an-email".into();
        form.payee_phone_number = "4165550100".into();
        form.payee_country = "CAN".into();
        form.discount_percent = Some(120.0);
        form.tax_percent = Some(13.005);

        match validate_create(&form) {
            ValidationResult::Invalid(failures) => {
                assert!(failures.contains("payee_email"));
                assert!(failures.contains("payee_phone_number"));
                assert!(failures.contains("payee_country"));
                assert!(failures.contains("discount_percent"));
                assert!(failures.contains("tax_percent"));
                assert_eq!(failures.len(), 5);
            }
            ValidationResult::Valid => panic!("expected failures"),
        }
    }
}
