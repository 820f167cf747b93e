use crate::domain::models::program::Program;
use crate::domain::models::schedule::{AvailableSchedule, WeeklySchedule};
use crate::domain::ports::ProgramRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Row, SqlitePool};

pub struct SqliteProgramRepo {
    pool: SqlitePool,
}

impl SqliteProgramRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgramRepository for SqliteProgramRepo {
    async fn create_with_schedule(
        &self,
        program: &Program,
        weekly: &WeeklySchedule,
    ) -> Result<Program, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Program>(
            "INSERT INTO programs (id, mentor_user_id, title, description, price, duration_min, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&program.id).bind(&program.mentor_user_id).bind(&program.title)
            .bind(&program.description).bind(program.price).bind(program.duration_min)
            .bind(program.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        let schedule = AvailableSchedule::new(created.id.clone(), weekly.clone());
        sqlx::query(
            "INSERT INTO available_schedules (id, program_id, weekly, created_at) VALUES (?, ?, ?, ?)"
        )
            .bind(&schedule.id).bind(&schedule.program_id)
            .bind(Json(weekly.clone())).bind(schedule.created_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Program>, AppError> {
        sqlx::query_as::<_, Program>("SELECT * FROM programs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_schedule(&self, program_id: &str) -> Result<Option<AvailableSchedule>, AppError> {
        sqlx::query_as::<_, AvailableSchedule>(
            "SELECT * FROM available_schedules WHERE program_id = ?"
        )
            .bind(program_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, mentor_user_id: &str, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let owner = sqlx::query("SELECT mentor_user_id FROM programs WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Program not found".to_string()))?;

        if owner.get::<String, _>("mentor_user_id") != mentor_user_id {
            return Err(AppError::Forbidden("Not the owner of this program".to_string()));
        }

        sqlx::query("DELETE FROM available_schedules WHERE program_id = ?")
            .bind(id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM programs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
