use serde::Serialize;

#[derive(Serialize)]
pub struct BookingReceiptResponse {
    pub reservation_id: String,
    pub order_id: String,
    pub amount: i64,
    pub order_name: String,
}

#[derive(Serialize)]
pub struct VerifyPaymentResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_retry: Option<bool>,
}
