use crate::domain::{models::service::Service, ports::ServiceRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteServiceRepo {
    pool: SqlitePool,
}

impl SqliteServiceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for SqliteServiceRepo {
    async fn create(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            "INSERT INTO services (id, name, category, base_price, estimated_duration_min, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&service.id).bind(&service.name).bind(&service.category).bind(service.base_price)
            .bind(service.estimated_duration_min).bind(service.is_active).bind(service.created_at).bind(service.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self, active_only: bool) -> Result<Vec<Service>, AppError> {
        let query = if active_only {
            "SELECT * FROM services WHERE is_active = 1 ORDER BY category ASC, name ASC"
        } else {
            "SELECT * FROM services ORDER BY category ASC, name ASC"
        };
        sqlx::query_as::<_, Service>(query).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            "UPDATE services SET name = ?, category = ?, base_price = ?, estimated_duration_min = ?, is_active = ?, updated_at = ?
             WHERE id = ?
             RETURNING *"
        )
            .bind(&service.name).bind(&service.category).bind(service.base_price).bind(service.estimated_duration_min)
            .bind(service.is_active).bind(service.updated_at).bind(&service.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
}
