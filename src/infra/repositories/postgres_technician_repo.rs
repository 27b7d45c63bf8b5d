use crate::domain::{models::technician::{AvailabilityStatus, Technician}, ports::TechnicianRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, Utc};

pub struct PostgresTechnicianRepo {
    pool: PgPool,
}

impl PostgresTechnicianRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TechnicianRepository for PostgresTechnicianRepo {
    async fn create(&self, technician: &Technician) -> Result<Technician, AppError> {
        sqlx::query_as::<_, Technician>(
            r#"
            INSERT INTO technicians (id, display_name, skills, service_areas, availability_status, rating, total_jobs, completed_jobs, active_jobs, earnings, is_verified, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#
        )
            .bind(&technician.id)
            .bind(&technician.display_name)
            .bind(&technician.skills)
            .bind(&technician.service_areas)
            .bind(technician.availability_status)
            .bind(technician.rating)
            .bind(technician.total_jobs)
            .bind(technician.completed_jobs)
            .bind(technician.active_jobs)
            .bind(technician.earnings)
            .bind(technician.is_verified)
            .bind(technician.is_active)
            .bind(technician.created_at)
            .bind(technician.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Technician>, AppError> {
        sqlx::query_as::<_, Technician>("SELECT * FROM technicians WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_dispatchable(&self) -> Result<Vec<Technician>, AppError> {
        sqlx::query_as::<_, Technician>(
            "SELECT * FROM technicians WHERE is_active AND is_verified AND availability_status = 'available'"
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, technician: &Technician) -> Result<Technician, AppError> {
        sqlx::query_as::<_, Technician>(
            r#"
            UPDATE technicians
            SET display_name = $1, skills = $2, service_areas = $3, rating = $4, is_verified = $5, is_active = $6, updated_at = $7
            WHERE id = $8
            RETURNING *
            "#
        )
            .bind(&technician.display_name)
            .bind(&technician.skills)
            .bind(&technician.service_areas)
            .bind(technician.rating)
            .bind(technician.is_verified)
            .bind(technician.is_active)
            .bind(technician.updated_at)
            .bind(&technician.id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_availability(&self, id: &str, status: AvailabilityStatus, at: DateTime<Utc>) -> Result<Option<Technician>, AppError> {
        sqlx::query_as::<_, Technician>("UPDATE technicians SET availability_status = $1, updated_at = $2 WHERE id = $3 RETURNING *")
            .bind(status)
            .bind(at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_by_availability(&self) -> Result<Vec<(AvailabilityStatus, i64)>, AppError> {
        sqlx::query_as::<_, (AvailabilityStatus, i64)>(
            "SELECT availability_status, COUNT(*) FROM technicians WHERE is_active GROUP BY availability_status"
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
