use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{FieldError, GatewayError};
use crate::models::{
    CreatePaymentResponse, EvidenceFile, NewPayment, PaymentRecord, PaymentUpdate,
    QueryDescriptor, UploadEvidenceResponse,
};

/// The remote payments API, abstracted from its wire shape so orchestration
/// can run against a test double.
#[async_trait]
pub trait PaymentsGateway: Send + Sync {
    async fn list(&self, query: &QueryDescriptor) -> Result<Vec<PaymentRecord>, GatewayError>;

    async fn create(&self, payment: &NewPayment) -> Result<CreatePaymentResponse, GatewayError>;

    async fn update(
        &self,
        record_id: &str,
        patch: &PaymentUpdate,
    ) -> Result<PaymentRecord, GatewayError>;

    async fn delete(&self, record_id: &str) -> Result<(), GatewayError>;

    async fn upload_evidence(
        &self,
        record_id: &str,
        file: EvidenceFile,
    ) -> Result<UploadEvidenceResponse, GatewayError>;

    /// URL the surrounding UI opens to download evidence; never fetched here.
    fn evidence_download_location(&self, record_id: &str) -> String;
}

// FastAPI error bodies: {"detail": "..."} for plain rejections,
// {"detail": [{"loc": [...], "msg": "..."}]} for per-field validation.
#[derive(Deserialize)]
struct ErrorBody {
    detail: ErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Fields(Vec<RawFieldError>),
}

#[derive(Deserialize)]
struct RawFieldError {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

impl From<RawFieldError> for FieldError {
    fn from(raw: RawFieldError) -> Self {
        let location = raw
            .loc
            .into_iter()
            .map(|segment| match segment {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        FieldError {
            location,
            message: raw.msg,
        }
    }
}

pub struct HttpPaymentsGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentsGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn payments_url(&self) -> String {
        format!("{}/payments", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }

    async fn rejection(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => match parsed.detail {
                ErrorDetail::Message(message) => GatewayError::Rejected {
                    status,
                    message,
                    field_errors: Vec::new(),
                },
                ErrorDetail::Fields(raw) => {
                    let field_errors: Vec<FieldError> =
                        raw.into_iter().map(FieldError::from).collect();
                    GatewayError::Rejected {
                        status,
                        message: format!("{} field error(s)", field_errors.len()),
                        field_errors,
                    }
                }
            },
            Err(_) => GatewayError::Rejected {
                status,
                message: if body.is_empty() {
                    "no error detail".to_string()
                } else {
                    body
                },
                field_errors: Vec::new(),
            },
        }
    }
}

#[async_trait]
impl PaymentsGateway for HttpPaymentsGateway {
    async fn list(&self, query: &QueryDescriptor) -> Result<Vec<PaymentRecord>, GatewayError> {
        tracing::debug!(
            page = query.page,
            page_size = query.page_size,
            search = %query.search,
            "Fetching payments"
        );
        let response = self
            .client
            .get(format!("{}/", self.payments_url()))
            .query(&query.as_query_params())
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create(&self, payment: &NewPayment) -> Result<CreatePaymentResponse, GatewayError> {
        let response = self
            .client
            .post(format!("{}/", self.payments_url()))
            .json(payment)
            .send()
            .await?;
        let created: CreatePaymentResponse = Self::decode(response).await?;
        tracing::info!(payment_id = %created.id, "Payment created");
        Ok(created)
    }

    async fn update(
        &self,
        record_id: &str,
        patch: &PaymentUpdate,
    ) -> Result<PaymentRecord, GatewayError> {
        let response = self
            .client
            .put(format!("{}/{}", self.payments_url(), record_id))
            .json(patch)
            .send()
            .await?;
        let updated: PaymentRecord = Self::decode(response).await?;
        tracing::info!(payment_id = %record_id, "Payment updated");
        Ok(updated)
    }

    async fn delete(&self, record_id: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.payments_url(), record_id))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        tracing::info!(payment_id = %record_id, "Payment deleted");
        Ok(())
    }

    async fn upload_evidence(
        &self,
        record_id: &str,
        file: EvidenceFile,
    ) -> Result<UploadEvidenceResponse, GatewayError> {
        tracing::debug!(
            payment_id = %record_id,
            filename = %file.filename,
            size = file.bytes.len(),
            "Uploading evidence"
        );
        let part = multipart::Part::bytes(file.bytes).file_name(file.filename);
        let form = multipart::Form::new().part("evidence_file", part);
        let response = self
            .client
            .post(format!("{}/{}/evidence", self.payments_url(), record_id))
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadEvidenceResponse = Self::decode(response).await?;
        tracing::info!(
            payment_id = %record_id,
            evidence_file_id = %uploaded.evidence_file_id,
            "Evidence uploaded"
        );
        Ok(uploaded)
    }

    fn evidence_download_location(&self, record_id: &str) -> String {
        format!("{}/{}/evidence", self.payments_url(), record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, SortOrder};
    use chrono::NaiveDate;
    use mockito::Matcher;

    fn record_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "payee_first_name": "Ada",
            "payee_last_name": "Smith",
            "payee_email": "ada@example.com",
            "payee_phone_number": "+14165550100",
            "payee_address_line_1": "12 King St",
            "payee_city": "Toronto",
            "payee_province_or_state": "ON",
            "payee_country": "CA",
            "payee_postal_code": "M5H 1A1",
            "payee_due_date": "2025-03-01",
            "currency": "USD",
            "due_amount": 100.0,
            "discount_percent": 20.0,
            "tax_percent": 13.0,
            "total_due": 93.0,
            "payee_payment_status": "pending"
        })
    }

    fn gateway(server: &mockito::ServerGuard) -> HttpPaymentsGateway {
        HttpPaymentsGateway::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn list_sends_the_descriptor_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/payments/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("page_size".into(), "10".into()),
                Matcher::UrlEncoded("search".into(), "smith".into()),
                Matcher::UrlEncoded("sort_order".into(), "asc".into()),
                Matcher::UrlEncoded("filter_status".into(), "pending".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!([record_json("a1")]).to_string())
            .create_async()
            .await;

        let query = QueryDescriptor::compose(2, 10, "smith", SortOrder::Asc, "pending");
        let payments = gateway(&server).list(&query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].id, "a1");
    }

    #[tokio::test]
    async fn create_maps_structured_field_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/payments/")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "detail": [
                        {"loc": ["body", "due_amount"], "msg": "field required"},
                        {"loc": ["body", "payee_email"], "msg": "value is not a valid email address"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let payment = NewPayment {
            payee_first_name: "Ada".into(),
            payee_last_name: "Smith".into(),
            payee_email: "ada@example.com".into(),
            payee_phone_number: "+14165550100".into(),
            payee_address_line_1: "12 King St".into(),
            payee_address_line_2: None,
            payee_city: "Toronto".into(),
            payee_province_or_state: "ON".into(),
            payee_country: "CA".into(),
            payee_postal_code: "M5H 1A1".into(),
            payee_due_date: NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
            currency: "USD".into(),
            due_amount: 250.0,
            discount_percent: 20.0,
            tax_percent: 13.0,
            payee_payment_status: PaymentStatus::Pending,
        };

        let err = gateway(&server).create(&payment).await.unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|f| f.field_name()).collect();
        assert_eq!(fields, vec!["due_amount", "payee_email"]);
        assert_eq!(err.status(), Some(422));
    }

    #[tokio::test]
    async fn update_sends_exactly_the_patch_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/payments/a1")
            .match_body(Matcher::Json(serde_json::json!({
                "payee_due_date": "2025-03-01",
                "due_amount": 150.0,
                "payee_payment_status": "completed",
                "evidence_file_id": "ev-123"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(record_json("a1").to_string())
            .create_async()
            .await;

        let patch = PaymentUpdate {
            payee_due_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            due_amount: 150.0,
            payee_payment_status: PaymentStatus::Completed,
            evidence_file_id: Some("ev-123".into()),
        };
        gateway(&server).update("a1", &patch).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_returns_the_generated_reference() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/payments/a1/evidence")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "evidence_file_id": "ev-123",
                    "message": "Evidence uploaded successfully."
                })
                .to_string(),
            )
            .create_async()
            .await;

        let uploaded = gateway(&server)
            .upload_evidence("a1", EvidenceFile::new("receipt.pdf", vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(uploaded.evidence_file_id, "ev-123");
    }

    #[tokio::test]
    async fn delete_surfaces_plain_detail_messages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/payments/missing")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({"detail": "Payment not found"}).to_string())
            .create_async()
            .await;

        let err = gateway(&server).delete("missing").await.unwrap_err();
        match err {
            GatewayError::Rejected {
                status, message, ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Payment not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn download_location_is_composed_not_fetched() {
        let gateway =
            HttpPaymentsGateway::new("http://api.local/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            gateway.evidence_download_location("a1"),
            "http://api.local/payments/a1/evidence"
        );
    }
}
