use crate::domain::models::outbox::OutboxEvent;
use crate::domain::ports::OutboxRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteOutboxRepo {
    pool: SqlitePool,
}

impl SqliteOutboxRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxRepository for SqliteOutboxRepo {
    async fn find_pending(&self, limit: i32) -> Result<Vec<OutboxEvent>, AppError> {
        sqlx::query_as::<_, OutboxEvent>(
            "SELECT * FROM outbox_events WHERE status = 'PENDING' ORDER BY created_at ASC LIMIT ?"
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
        sqlx::query("UPDATE outbox_events SET status = ?, error_message = ? WHERE id = ?")
            .bind(status).bind(error_message).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
