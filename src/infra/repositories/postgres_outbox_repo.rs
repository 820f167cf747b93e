use crate::domain::models::outbox::OutboxEvent;
use crate::domain::ports::OutboxRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresOutboxRepo {
    pool: PgPool,
}

impl PostgresOutboxRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxRepository for PostgresOutboxRepo {
    async fn find_pending(&self, limit: i32) -> Result<Vec<OutboxEvent>, AppError> {
        sqlx::query_as::<_, OutboxEvent>(
            "SELECT * FROM outbox_events WHERE status = 'PENDING' ORDER BY created_at ASC LIMIT $1"
        )
            .bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_status(
        &self,
        id: &str,
        status: &str,
        error_message: Option<String>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE outbox_events SET status = $1, error_message = $2 WHERE id = $3")
            .bind(status).bind(error_message).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
