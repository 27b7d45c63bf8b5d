use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;
use crate::domain::models::lifecycle::DomainEvent;
use crate::domain::ports::EventSink;
use crate::error::AppError;

pub struct WebhookSink {
    client: Client,
    url: String,
    token: Option<String>,
}

impl WebhookSink {
    pub fn new(url: String, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
            token,
        }
    }
}

#[derive(Serialize)]
struct EventEnvelope<'a> {
    event_id: &'a str,
    event_type: &'a str,
    booking_id: &'a str,
    occurred_at: String,
    event: &'a DomainEvent,
}

#[async_trait]
impl EventSink for WebhookSink {
    async fn deliver(&self, event: &DomainEvent) -> Result<(), AppError> {
        let envelope = EventEnvelope {
            event_id: event.event_id(),
            event_type: event.kind(),
            booking_id: event.booking_id(),
            occurred_at: event.occurred_at().to_rfc3339(),
            event,
        };

        // Consumers dedupe on the event id; redelivery reuses it.
        let mut request = self.client.post(&self.url)
            .header("Idempotency-Key", event.event_id())
            .json(&envelope);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let res = request.send().await.map_err(|e| {
            let msg = format!("Webhook connection error: {}", e);
            error!("{}", msg);
            AppError::InternalWithMsg(msg)
        })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Webhook rejected event. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}
