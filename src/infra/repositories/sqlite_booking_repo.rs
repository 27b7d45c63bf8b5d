use crate::domain::{models::booking::{Booking, BookingStatus}, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, client_id, technician_id, service_id, status, scheduled_date, scheduled_time, service_address, service_city, service_latitude, service_longitude, notes, total_price, commission, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.client_id).bind(&booking.technician_id).bind(&booking.service_id)
            .bind(booking.status).bind(booking.scheduled_date).bind(booking.scheduled_time)
            .bind(&booking.service_address).bind(&booking.service_city).bind(booking.service_latitude).bind(booking.service_longitude)
            .bind(&booking.notes).bind(booking.total_price).bind(booking.commission).bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE client_id = ? ORDER BY scheduled_date ASC, scheduled_time ASC").bind(client_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_technician(&self, technician_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE technician_id = ? ORDER BY scheduled_date ASC, scheduled_time ASC").bind(technician_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update_status(&self, id: &str, from: BookingStatus, to: BookingStatus, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ? RETURNING *")
            .bind(to).bind(at).bind(id).bind(from)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn complete(&self, id: &str, technician_id: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let completed = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'completed', updated_at = ?
             WHERE id = ? AND status = 'in_progress' AND technician_id = ?
             RETURNING *"
        )
            .bind(at).bind(id).bind(technician_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let Some(completed) = completed else { return Ok(None) };

        sqlx::query(
            "UPDATE technicians
             SET total_jobs = total_jobs + 1, completed_jobs = completed_jobs + 1, earnings = earnings + ?,
                 active_jobs = MAX(active_jobs - 1, 0), updated_at = ?
             WHERE id = ?"
        )
            .bind(completed.technician_payout()).bind(at).bind(technician_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(completed))
    }
    async fn claim_technician(&self, id: &str, technician_id: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let claimed = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET technician_id = ?, status = 'assigned', updated_at = ?
             WHERE id = ? AND technician_id IS NULL AND status IN ('pending', 'confirmed')
             RETURNING *"
        )
            .bind(technician_id).bind(at).bind(id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let Some(claimed) = claimed else { return Ok(None) };

        sqlx::query("UPDATE technicians SET active_jobs = active_jobs + 1, updated_at = ? WHERE id = ?")
            .bind(at).bind(technician_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(claimed))
    }
    async fn swap_technician(&self, id: &str, previous: &str, next: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let swapped = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET technician_id = ?, updated_at = ?
             WHERE id = ? AND status = 'assigned' AND technician_id = ?
             RETURNING *"
        )
            .bind(next).bind(at).bind(id).bind(previous)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let Some(swapped) = swapped else { return Ok(None) };

        sqlx::query("UPDATE technicians SET active_jobs = MAX(active_jobs - 1, 0), updated_at = ? WHERE id = ?")
            .bind(at).bind(previous)
            .execute(&mut *tx).await.map_err(AppError::Database)?;
        sqlx::query("UPDATE technicians SET active_jobs = active_jobs + 1, updated_at = ? WHERE id = ?")
            .bind(at).bind(next)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(swapped))
    }
    async fn cancel(&self, id: &str, from: BookingStatus, bound: Option<&str>, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let cancelled = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'cancelled', technician_id = NULL, updated_at = ?
             WHERE id = ? AND status = ? AND technician_id IS ?
             RETURNING *"
        )
            .bind(at).bind(id).bind(from).bind(bound)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let Some(cancelled) = cancelled else { return Ok(None) };

        if let Some(technician_id) = bound {
            sqlx::query("UPDATE technicians SET active_jobs = MAX(active_jobs - 1, 0), updated_at = ? WHERE id = ?")
                .bind(at).bind(technician_id)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(cancelled))
    }
    async fn reschedule(&self, id: &str, from: BookingStatus, date: NaiveDate, time: NaiveTime, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET scheduled_date = ?, scheduled_time = ?, updated_at = ?
             WHERE id = ? AND status = ?
             RETURNING *"
        )
            .bind(date).bind(time).bind(at).bind(id).bind(from)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn count_by_status(&self) -> Result<Vec<(BookingStatus, i64)>, AppError> {
        sqlx::query_as::<_, (BookingStatus, i64)>("SELECT status, COUNT(*) FROM bookings GROUP BY status")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
