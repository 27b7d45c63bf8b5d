use crate::domain::{models::service::Service, ports::ServiceRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresServiceRepo {
    pool: PgPool,
}

impl PostgresServiceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for PostgresServiceRepo {
    async fn create(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (id, name, category, base_price, estimated_duration_min, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#
        )
            .bind(&service.id)
            .bind(&service.name)
            .bind(&service.category)
            .bind(service.base_price)
            .bind(service.estimated_duration_min)
            .bind(service.is_active)
            .bind(service.created_at)
            .bind(service.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Service>, AppError> {
        sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE is_active OR NOT $1 ORDER BY category ASC, name ASC"
        )
            .bind(active_only)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET name = $1, category = $2, base_price = $3, estimated_duration_min = $4, is_active = $5, updated_at = $6
            WHERE id = $7
            RETURNING *
            "#
        )
            .bind(&service.name)
            .bind(&service.category)
            .bind(service.base_price)
            .bind(service.estimated_duration_min)
            .bind(service.is_active)
            .bind(service.updated_at)
            .bind(&service.id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
