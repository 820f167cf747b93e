use crate::domain::models::outbox::OutboxEvent;
use crate::domain::ports::Notifier;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;

/// Pushes outbox events to the real-time notification service.
pub struct HttpNotifier {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpNotifier {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct PushPayload<'a> {
    recipient_user_id: &'a str,
    event_type: &'a str,
    reservation_id: &'a str,
    program_id: &'a str,
    message: &'a str,
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn deliver(&self, event: &OutboxEvent) -> Result<(), AppError> {
        let payload = PushPayload {
            recipient_user_id: &event.recipient_user_id,
            event_type: &event.event_type,
            reservation_id: &event.reservation_id,
            program_id: &event.program_id,
            message: &event.message,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notification service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notification service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}
