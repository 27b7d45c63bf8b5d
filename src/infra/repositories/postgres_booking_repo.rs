use crate::domain::{models::booking::{Booking, BookingStatus}, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, client_id, technician_id, service_id, status, scheduled_date, scheduled_time, service_address, service_city, service_latitude, service_longitude, notes, total_price, commission, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *"
        )
            .bind(&booking.id)
            .bind(&booking.client_id)
            .bind(&booking.technician_id)
            .bind(&booking.service_id)
            .bind(booking.status)
            .bind(booking.scheduled_date)
            .bind(booking.scheduled_time)
            .bind(&booking.service_address)
            .bind(&booking.service_city)
            .bind(booking.service_latitude)
            .bind(booking.service_longitude)
            .bind(&booking.notes)
            .bind(booking.total_price)
            .bind(booking.commission)
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE client_id = $1 ORDER BY scheduled_date ASC, scheduled_time ASC")
            .bind(client_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_technician(&self, technician_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE technician_id = $1 ORDER BY scheduled_date ASC, scheduled_time ASC")
            .bind(technician_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_status(&self, id: &str, from: BookingStatus, to: BookingStatus, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *")
            .bind(to)
            .bind(at)
            .bind(id)
            .bind(from)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn complete(&self, id: &str, technician_id: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let completed = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'completed', updated_at = $1
            WHERE id = $2 AND status = 'in_progress' AND technician_id = $3
            RETURNING *
            "#
        )
            .bind(at)
            .bind(id)
            .bind(technician_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(completed) = completed else { return Ok(None) };

        sqlx::query(
            r#"
            UPDATE technicians
            SET total_jobs = total_jobs + 1,
                completed_jobs = completed_jobs + 1,
                earnings = earnings + $1,
                active_jobs = GREATEST(active_jobs - 1, 0),
                updated_at = $2
            WHERE id = $3
            "#
        )
            .bind(completed.technician_payout())
            .bind(at)
            .bind(technician_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(completed))
    }

    async fn claim_technician(&self, id: &str, technician_id: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Row lock taken by the UPDATE; a racing claim re-evaluates the guard after we commit.
        let claimed = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET technician_id = $1, status = 'assigned', updated_at = $2
            WHERE id = $3 AND technician_id IS NULL AND status IN ('pending', 'confirmed')
            RETURNING *
            "#
        )
            .bind(technician_id)
            .bind(at)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(claimed) = claimed else { return Ok(None) };

        sqlx::query("UPDATE technicians SET active_jobs = active_jobs + 1, updated_at = $1 WHERE id = $2")
            .bind(at)
            .bind(technician_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(claimed))
    }

    async fn swap_technician(&self, id: &str, previous: &str, next: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let swapped = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET technician_id = $1, updated_at = $2
            WHERE id = $3 AND status = 'assigned' AND technician_id = $4
            RETURNING *
            "#
        )
            .bind(next)
            .bind(at)
            .bind(id)
            .bind(previous)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(swapped) = swapped else { return Ok(None) };

        sqlx::query("UPDATE technicians SET active_jobs = GREATEST(active_jobs - 1, 0), updated_at = $1 WHERE id = $2")
            .bind(at)
            .bind(previous)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query("UPDATE technicians SET active_jobs = active_jobs + 1, updated_at = $1 WHERE id = $2")
            .bind(at)
            .bind(next)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(swapped))
    }

    async fn cancel(&self, id: &str, from: BookingStatus, bound: Option<&str>, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let cancelled = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'cancelled', technician_id = NULL, updated_at = $1
            WHERE id = $2 AND status = $3 AND technician_id IS NOT DISTINCT FROM $4
            RETURNING *
            "#
        )
            .bind(at)
            .bind(id)
            .bind(from)
            .bind(bound)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(cancelled) = cancelled else { return Ok(None) };

        if let Some(technician_id) = bound {
            sqlx::query("UPDATE technicians SET active_jobs = GREATEST(active_jobs - 1, 0), updated_at = $1 WHERE id = $2")
                .bind(at)
                .bind(technician_id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(cancelled))
    }

    async fn reschedule(&self, id: &str, from: BookingStatus, date: NaiveDate, time: NaiveTime, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET scheduled_date = $1, scheduled_time = $2, updated_at = $3 WHERE id = $4 AND status = $5 RETURNING *"
        )
            .bind(date)
            .bind(time)
            .bind(at)
            .bind(id)
            .bind(from)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_by_status(&self) -> Result<Vec<(BookingStatus, i64)>, AppError> {
        sqlx::query_as::<_, (BookingStatus, i64)>("SELECT status, COUNT(*) FROM bookings GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
