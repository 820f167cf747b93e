use crate::domain::models::outbox::OutboxEvent;
use crate::domain::models::payment::{Payment, PaymentContext, PaymentStatus};
use crate::domain::ports::{ConfirmApply, PaymentListItem, PaymentRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqlitePaymentRepo {
    pool: SqlitePool,
}

impl SqlitePaymentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const CONTEXT_SELECT: &str =
    "SELECT p.id, p.order_id, p.price, p.title, p.payment_key, p.receipt_url, p.status, p.user_id, p.reservation_id,
            r.status as reservation_status, r.program_id, pr.mentor_user_id
     FROM payments p
     JOIN reservations r ON r.id = p.reservation_id
     JOIN programs pr ON pr.id = r.program_id";

#[async_trait]
impl PaymentRepository for SqlitePaymentRepo {
    async fn find_context_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<PaymentContext>, AppError> {
        sqlx::query_as::<_, PaymentContext>(&format!("{} WHERE p.order_id = ?", CONTEXT_SELECT))
            .bind(order_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_context_by_key_for_user(
        &self,
        payment_key: &str,
        user_id: &str,
    ) -> Result<Option<PaymentContext>, AppError> {
        sqlx::query_as::<_, PaymentContext>(
            &format!("{} WHERE p.payment_key = ? AND p.user_id = ?", CONTEXT_SELECT)
        )
            .bind(payment_key).bind(user_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_reservation_id(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE reservation_id = ?")
            .bind(reservation_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_completed(
        &self,
        order_id: &str,
        payment_key: &str,
        receipt_url: Option<&str>,
        paid_at: DateTime<Utc>,
        event: &OutboxEvent,
    ) -> Result<ConfirmApply, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Optimistic guard: the gateway call already happened outside
        // this transaction, so re-check state at commit time.
        let result = sqlx::query(
            "UPDATE payments SET payment_key = ?, status = 'COMPLETED', paid_at = ?, receipt_url = ?
             WHERE order_id = ? AND status = 'PENDING'"
        )
            .bind(payment_key).bind(paid_at).bind(receipt_url).bind(order_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            let row = sqlx::query("SELECT status FROM payments WHERE order_id = ?")
                .bind(order_id)
                .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;
            return match row {
                Some(r) if r.get::<String, _>("status")
                    == PaymentStatus::Completed.as_str() =>
                {
                    Ok(ConfirmApply::AlreadyCompleted)
                }
                Some(_) => Err(AppError::Conflict("Payment is not pending".to_string())),
                None => Err(AppError::NotFound("Payment not found".to_string())),
            };
        }

        let reservation_id: String = sqlx::query("SELECT reservation_id FROM payments WHERE order_id = ?")
            .bind(order_id)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?
            .get("reservation_id");

        // Clearing the soft lock keeps the paid booking inside the
        // conflict window forever.
        sqlx::query(
            "UPDATE reservations SET status = 'CONFIRMED', expire = NULL WHERE id = ?"
        )
            .bind(&reservation_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        insert_outbox(&mut tx, event).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(ConfirmApply::Applied)
    }

    async fn mark_refunded(
        &self,
        payment_id: &str,
        reservation_id: &str,
        reason: Option<&str>,
        event: &OutboxEvent,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let result = sqlx::query(
            "UPDATE payments SET status = 'REFUNDED' WHERE id = ? AND status = 'COMPLETED'"
        )
            .bind(payment_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Payment is not refundable".to_string()));
        }

        sqlx::query(
            "UPDATE reservations SET status = 'CANCELLED', reason = COALESCE(?, reason) WHERE id = ?"
        )
            .bind(reason).bind(reservation_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        insert_outbox(&mut tx, event).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentListItem>, AppError> {
        sqlx::query_as::<_, PaymentListItem>(
            "SELECT id, order_id, price, title, payment_key, paid_at, receipt_url, status, created_at
             FROM payments WHERE user_id = ? AND status != 'PENDING'
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        )
            .bind(user_id).bind(limit).bind(offset)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}

async fn insert_outbox(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    event: &OutboxEvent,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO outbox_events (id, event_type, recipient_user_id, reservation_id, program_id, message, status, error_message, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
        .bind(&event.id).bind(&event.event_type).bind(&event.recipient_user_id)
        .bind(&event.reservation_id).bind(&event.program_id).bind(&event.message)
        .bind(&event.status).bind(&event.error_message).bind(event.created_at)
        .execute(&mut **tx).await.map_err(AppError::Database)?;
    Ok(())
}
