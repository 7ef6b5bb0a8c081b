use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_DISCOUNT_PERCENT: f64 = 20.0;
pub const DEFAULT_TAX_PERCENT: f64 = 13.0;

/// Payment lifecycle state. `overdue` is derived by the server from the due
/// date and is display-only; it is never accepted from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    DueNow,
    Overdue,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::DueNow => "due_now",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Completed => "completed",
        }
    }

    pub fn user_selectable(self) -> bool {
        !matches!(self, PaymentStatus::Overdue)
    }
}

/// A payee payment record as held by the remote payments API. The client
/// keeps read/write-through copies only; `total_due` and
/// `payee_added_date_utc` are server-derived and never sent back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub payee_first_name: String,
    pub payee_last_name: String,
    pub payee_email: String,
    pub payee_phone_number: String,
    pub payee_address_line_1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee_address_line_2: Option<String>,
    pub payee_city: String,
    pub payee_province_or_state: String,
    pub payee_country: String,
    pub payee_postal_code: String,
    pub payee_due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee_added_date_utc: Option<DateTime<Utc>>,
    pub currency: String,
    pub due_amount: f64,
    #[serde(default = "default_discount_percent")]
    pub discount_percent: f64,
    #[serde(default = "default_tax_percent")]
    pub tax_percent: f64,
    pub total_due: f64,
    pub payee_payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_file_id: Option<String>,
}

fn default_discount_percent() -> f64 {
    DEFAULT_DISCOUNT_PERCENT
}

fn default_tax_percent() -> f64 {
    DEFAULT_TAX_PERCENT
}

/// Create-call body. New payments always start at `pending`; the server
/// stamps the added date and computes `total_due`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub payee_first_name: String,
    pub payee_last_name: String,
    pub payee_email: String,
    pub payee_phone_number: String,
    pub payee_address_line_1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee_address_line_2: Option<String>,
    pub payee_city: String,
    pub payee_province_or_state: String,
    pub payee_country: String,
    pub payee_postal_code: String,
    pub payee_due_date: NaiveDate,
    pub currency: String,
    pub due_amount: f64,
    pub discount_percent: f64,
    pub tax_percent: f64,
    pub payee_payment_status: PaymentStatus,
}

/// The restricted partial patch accepted by the update endpoint. Exactly
/// these four fields are sent; anything else a form snapshot may hold stays
/// on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub payee_due_date: NaiveDate,
    pub due_amount: f64,
    pub payee_payment_status: PaymentStatus,
    pub evidence_file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadEvidenceResponse {
    pub evidence_file_id: String,
    #[serde(default)]
    pub message: String,
}
