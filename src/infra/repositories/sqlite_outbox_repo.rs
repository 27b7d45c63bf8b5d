use crate::domain::{models::outbox::OutboxEvent, ports::OutboxRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, Utc};

pub struct SqliteOutboxRepo {
    pool: SqlitePool,
}

impl SqliteOutboxRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl OutboxRepository for SqliteOutboxRepo {
    async fn enqueue(&self, event: &OutboxEvent) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO outbox_events (id, booking_id, event_type, payload, status, attempts, next_attempt_at, last_error, claimed_at, created_at, delivered_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING"
        )
            .bind(&event.id)
            .bind(&event.booking_id)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(&event.status)
            .bind(event.attempts)
            .bind(event.next_attempt_at)
            .bind(&event.last_error)
            .bind(event.claimed_at)
            .bind(event.created_at)
            .bind(event.delivered_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn claim_due(&self, limit: i32, now: DateTime<Utc>, stale_before: DateTime<Utc>) -> Result<Vec<OutboxEvent>, AppError> {
        sqlx::query_as::<_, OutboxEvent>(
            "UPDATE outbox_events SET status = 'PROCESSING', claimed_at = ?
             WHERE id IN (
                 SELECT id FROM outbox_events
                 WHERE (status = 'PENDING' AND next_attempt_at <= ?)
                    OR (status = 'PROCESSING' AND claimed_at <= ?)
                 ORDER BY created_at ASC
                 LIMIT ?
             )
             RETURNING *"
        )
            .bind(now)
            .bind(now)
            .bind(stale_before)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_delivered(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE outbox_events SET status = 'DELIVERED', attempts = attempts + 1, delivered_at = ?, last_error = NULL WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn schedule_retry(&self, id: &str, attempts: i32, next_attempt_at: DateTime<Utc>, error: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE outbox_events SET status = 'PENDING', attempts = ?, next_attempt_at = ?, last_error = ?, claimed_at = NULL WHERE id = ?")
            .bind(attempts)
            .bind(next_attempt_at)
            .bind(error)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn mark_failed(&self, id: &str, attempts: i32, error: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE outbox_events SET status = 'FAILED', attempts = ?, last_error = ? WHERE id = ?")
            .bind(attempts)
            .bind(error)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_by_booking(&self, booking_id: &str) -> Result<Vec<OutboxEvent>, AppError> {
        sqlx::query_as::<_, OutboxEvent>("SELECT * FROM outbox_events WHERE booking_id = ? ORDER BY created_at ASC")
            .bind(booking_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
