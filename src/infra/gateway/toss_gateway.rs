use crate::domain::ports::{CancelOutcome, ConfirmOutcome, PaymentGateway};
use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Fixed backoff before the single confirm retry. One retry only; the
/// gateway's own "already processed" signal is the idempotency backstop.
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

pub struct TossGateway {
    client: Client,
    base_url: String,
    auth_header: String,
}

impl TossGateway {
    pub fn new(base_url: String, secret_key: &str, timeout_secs: u64) -> Self {
        let encoded = general_purpose::STANDARD.encode(format!("{}:", secret_key));
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url,
            auth_header: format!("Basic {}", encoded),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmRequest<'a> {
    order_id: &'a str,
    amount: i64,
    payment_key: &'a str,
}

#[derive(Deserialize)]
struct ReceiptPayload {
    url: String,
}

#[derive(Deserialize)]
struct ConfirmResponse {
    status: String,
    #[serde(rename = "totalAmount")]
    total_amount: i64,
    receipt: Option<ReceiptPayload>,
}

/// Error payloads carry the original amount and receipt when the code is
/// ALREADY_PROCESSED_PAYMENT.
#[derive(Deserialize)]
struct GatewayErrorBody {
    code: String,
    #[serde(default)]
    message: String,
    #[serde(rename = "totalAmount")]
    total_amount: Option<i64>,
    receipt: Option<ReceiptPayload>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelRequest<'a> {
    cancel_reason: &'a str,
}

#[derive(Deserialize)]
struct CancelResponse {
    status: String,
}

#[async_trait]
impl PaymentGateway for TossGateway {
    async fn confirm(
        &self,
        order_id: &str,
        amount: i64,
        payment_key: &str,
    ) -> Result<ConfirmOutcome, AppError> {
        let url = format!("{}/v1/payments/confirm", self.base_url);
        let body = ConfirmRequest {
            order_id,
            amount,
            payment_key,
        };

        let mut last_transient = String::new();
        for attempt in 0..2 {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BACKOFF).await;
            }

            let response = self
                .client
                .post(&url)
                .header("Authorization", &self.auth_header)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    warn!(%order_id, attempt, "gateway confirm transport error: {}", e);
                    last_transient = e.to_string();
                    continue;
                }
            };

            if response.status().is_success() {
                let parsed: ConfirmResponse = response
                    .json()
                    .await
                    .map_err(|e| AppError::InternalWithMsg(format!("Malformed gateway response: {}", e)))?;
                return Ok(ConfirmOutcome::Approved {
                    status: parsed.status,
                    total_amount: parsed.total_amount,
                    receipt_url: parsed.receipt.map(|r| r.url),
                });
            }

            let http_status = response.status();
            let error_body: Option<GatewayErrorBody> = response.json().await.ok();

            match error_body {
                Some(err) if err.code == "ALREADY_PROCESSED_PAYMENT" => {
                    // A retried confirm whose first attempt landed. Not an
                    // error; reconcile from the reported amount/receipt.
                    return Ok(ConfirmOutcome::AlreadyProcessed {
                        total_amount: err.total_amount.unwrap_or_default(),
                        receipt_url: err.receipt.map(|r| r.url),
                    });
                }
                Some(err) if err.code == "PROVIDER_ERROR" => {
                    warn!(%order_id, attempt, "gateway provider error: {}", err.message);
                    last_transient = err.message;
                    continue;
                }
                Some(err) => {
                    return Ok(ConfirmOutcome::Rejected {
                        code: err.code,
                        message: err.message,
                    });
                }
                None if http_status.is_server_error() => {
                    warn!(%order_id, attempt, status = %http_status, "gateway confirm 5xx");
                    last_transient = format!("gateway returned {}", http_status);
                    continue;
                }
                None => {
                    return Ok(ConfirmOutcome::Rejected {
                        code: http_status.to_string(),
                        message: "Unreadable gateway error response".to_string(),
                    });
                }
            }
        }

        Ok(ConfirmOutcome::Transient {
            message: last_transient,
        })
    }

    async fn cancel(&self, payment_key: &str, reason: &str) -> Result<CancelOutcome, AppError> {
        let url = format!("{}/v1/payments/{}/cancel", self.base_url, payment_key);

        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(&CancelRequest { cancel_reason: reason })
            .send()
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Gateway cancel transport error: {}", e)))?;

        if !response.status().is_success() {
            let http_status = response.status();
            let err: Option<GatewayErrorBody> = response.json().await.ok();
            let (code, message) = match err {
                Some(e) => (e.code, e.message),
                None => (http_status.to_string(), "Unreadable gateway error response".to_string()),
            };
            return Ok(CancelOutcome::Rejected { code, message });
        }

        let parsed: CancelResponse = response
            .json()
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Malformed gateway response: {}", e)))?;

        if parsed.status == "CANCELED" {
            Ok(CancelOutcome::Cancelled)
        } else {
            Ok(CancelOutcome::Rejected {
                code: parsed.status,
                message: "Cancellation did not reach the CANCELED state".to_string(),
            })
        }
    }
}
