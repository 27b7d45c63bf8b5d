use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::time::sleep;
use tracing::{error, info, warn, info_span, Instrument};
use crate::domain::ports::{EventSink, OutboxRepository};
use crate::error::AppError;

const BATCH_SIZE: i32 = 20;
const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: i32,
    pub base_delay: chrono::Duration,
    pub max_delay: chrono::Duration,
    /// A PROCESSING row older than this is assumed orphaned and claimed again.
    pub lease: chrono::Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: i32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: chrono::Duration::seconds(2),
            max_delay: chrono::Duration::minutes(10),
            lease: chrono::Duration::seconds(60),
        }
    }

    /// Exponential backoff for the given attempt count, before jitter.
    pub fn backoff(&self, attempts: i32) -> chrono::Duration {
        let exp = attempts.saturating_sub(1).clamp(0, 20) as u32;
        let delay = self.base_delay * 2_i32.saturating_pow(exp);
        delay.min(self.max_delay)
    }

    fn next_attempt_at(&self, attempts: i32, now: DateTime<Utc>) -> DateTime<Utc> {
        let delay = self.backoff(attempts);
        let jitter_cap = (delay.num_milliseconds() / 4).max(1);
        let jitter = rand::thread_rng().gen_range(0..=jitter_cap);
        now + delay + chrono::Duration::milliseconds(jitter)
    }
}

/// Delivers one batch of due outbox rows. Returns how many were delivered.
pub async fn relay_once(
    outbox: &dyn OutboxRepository,
    sink: &dyn EventSink,
    policy: &RetryPolicy,
    now: DateTime<Utc>,
) -> Result<usize, AppError> {
    let mut batch = outbox.claim_due(BATCH_SIZE, now, now - policy.lease).await?;
    // RETURNING order is unspecified
    batch.sort_by_key(|row| row.created_at);
    let mut delivered = 0;

    for row in batch {
        let span = info_span!(
            "outbox_delivery",
            event_id = %row.id,
            event_type = %row.event_type,
            booking_id = %row.booking_id,
            attempt = row.attempts + 1
        );

        async {
            let attempts = row.attempts + 1;
            match sink.deliver(&row.payload.0).await {
                Ok(()) => {
                    if let Err(e) = outbox.mark_delivered(&row.id, Utc::now()).await {
                        error!("Failed to mark event as delivered: {:?}", e);
                    } else {
                        delivered += 1;
                    }
                }
                Err(e) => {
                    let err_msg = format!("{}", e);
                    let result = if attempts >= policy.max_attempts {
                        error!("Giving up on event after {} attempts: {}", attempts, err_msg);
                        outbox.mark_failed(&row.id, attempts, &err_msg).await
                    } else {
                        let next = policy.next_attempt_at(attempts, now);
                        warn!("Delivery failed, retrying at {}: {}", next, err_msg);
                        outbox.schedule_retry(&row.id, attempts, next, &err_msg).await
                    };
                    if let Err(up_err) = result {
                        error!("Failed to record delivery failure: {:?}", up_err);
                    }
                }
            }
        }
            .instrument(span)
            .await;
    }

    Ok(delivered)
}

pub async fn start_outbox_relay(
    outbox: Arc<dyn OutboxRepository>,
    sink: Arc<dyn EventSink>,
    policy: RetryPolicy,
) {
    info!("Starting outbox relay...");

    loop {
        match relay_once(outbox.as_ref(), sink.as_ref(), &policy, Utc::now()).await {
            Ok(0) => {}
            Ok(n) => info!("Relayed {} booking events", n),
            Err(e) => error!("Failed to claim outbox events: {:?}", e),
        }
        sleep(POLL_INTERVAL).await;
    }
}
