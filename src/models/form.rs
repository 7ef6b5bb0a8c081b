use chrono::NaiveDate;

use crate::models::payment::{
    NewPayment, PaymentRecord, PaymentStatus, PaymentUpdate, DEFAULT_CURRENCY,
    DEFAULT_DISCOUNT_PERCENT, DEFAULT_TAX_PERCENT,
};

/// A staged, not-yet-uploaded evidence artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl EvidenceFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The in-progress state of one edit session. Seeded from the selected
/// record when the session opens, mutated by caller input, consumed on
/// submit. `evidence_file` holds bytes awaiting upload; `evidence_file_id`
/// is the committed reference once an upload has happened.
#[derive(Debug, Clone, Default)]
pub struct EditFormSnapshot {
    pub payee_due_date: Option<NaiveDate>,
    pub due_amount: Option<f64>,
    pub payee_payment_status: Option<PaymentStatus>,
    pub evidence_file: Option<EvidenceFile>,
    pub evidence_file_id: Option<String>,
}

impl EditFormSnapshot {
    pub fn from_record(record: &PaymentRecord) -> Self {
        Self {
            payee_due_date: Some(record.payee_due_date),
            due_amount: Some(record.due_amount),
            payee_payment_status: Some(record.payee_payment_status),
            evidence_file: None,
            evidence_file_id: record.evidence_file_id.clone(),
        }
    }

    pub fn has_staged_evidence(&self) -> bool {
        self.evidence_file.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// The restricted patch built from this snapshot, or `None` while a
    /// required field is still unset. Validation runs before this on the
    /// submit path.
    pub fn update_payload(&self) -> Option<PaymentUpdate> {
        Some(PaymentUpdate {
            payee_due_date: self.payee_due_date?,
            due_amount: self.due_amount?,
            payee_payment_status: self.payee_payment_status?,
            evidence_file_id: self.evidence_file_id.clone(),
        })
    }
}

/// The create-dialog state: the full field set, with the documented seeds
/// for currency, discount, tax. Text fields left empty count as missing.
#[derive(Debug, Clone)]
pub struct CreateForm {
    pub payee_first_name: String,
    pub payee_last_name: String,
    pub payee_email: String,
    pub payee_phone_number: String,
    pub payee_address_line_1: String,
    pub payee_address_line_2: String,
    pub payee_city: String,
    pub payee_province_or_state: String,
    pub payee_country: String,
    pub payee_postal_code: String,
    pub payee_due_date: Option<NaiveDate>,
    pub currency: String,
    pub due_amount: Option<f64>,
    pub discount_percent: Option<f64>,
    pub tax_percent: Option<f64>,
}

impl Default for CreateForm {
    fn default() -> Self {
        Self {
            payee_first_name: String::new(),
            payee_last_name: String::new(),
            payee_email: String::new(),
            payee_phone_number: String::new(),
            payee_address_line_1: String::new(),
            payee_address_line_2: String::new(),
            payee_city: String::new(),
            payee_province_or_state: String::new(),
            payee_country: String::new(),
            payee_postal_code: String::new(),
            payee_due_date: None,
            currency: DEFAULT_CURRENCY.to_string(),
            due_amount: None,
            discount_percent: Some(DEFAULT_DISCOUNT_PERCENT),
            tax_percent: Some(DEFAULT_TAX_PERCENT),
        }
    }
}

impl CreateForm {
    /// The create-call body, or `None` while a required value is unset.
    /// New payments always start at `pending`; seeds fill any percent the
    /// form cleared.
    pub fn create_payload(&self) -> Option<NewPayment> {
        Some(NewPayment {
            payee_first_name: self.payee_first_name.clone(),
            payee_last_name: self.payee_last_name.clone(),
            payee_email: self.payee_email.clone(),
            payee_phone_number: self.payee_phone_number.clone(),
            payee_address_line_1: self.payee_address_line_1.clone(),
            payee_address_line_2: if self.payee_address_line_2.is_empty() {
                None
            } else {
                Some(self.payee_address_line_2.clone())
            },
            payee_city: self.payee_city.clone(),
            payee_province_or_state: self.payee_province_or_state.clone(),
            payee_country: self.payee_country.clone(),
            payee_postal_code: self.payee_postal_code.clone(),
            payee_due_date: self.payee_due_date?,
            currency: self.currency.clone(),
            due_amount: self.due_amount?,
            discount_percent: self.discount_percent.unwrap_or(DEFAULT_DISCOUNT_PERCENT),
            tax_percent: self.tax_percent.unwrap_or(DEFAULT_TAX_PERCENT),
            payee_payment_status: PaymentStatus::Pending,
        })
    }
}
