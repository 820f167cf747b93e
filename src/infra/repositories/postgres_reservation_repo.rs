use crate::domain::models::{contact::Contact, outbox::OutboxEvent, payment::Payment, reservation::Reservation};
use crate::domain::ports::{ReminderDue, ReservationListItem, ReservationRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};

pub struct PostgresReservationRepo {
    pool: PgPool,
}

impl PostgresReservationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn reap_expired(
    tx: &mut Transaction<'_, Postgres>,
    program_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<u64, AppError> {
    let rows_affected = match program_id {
        Some(pid) => {
            sqlx::query(
                "DELETE FROM contacts WHERE reservation_id IN
                 (SELECT id FROM reservations WHERE status = 'PENDING' AND expire < $1 AND program_id = $2)"
            ).bind(now).bind(pid).execute(&mut **tx).await.map_err(AppError::Database)?;
            sqlx::query(
                "DELETE FROM payments WHERE reservation_id IN
                 (SELECT id FROM reservations WHERE status = 'PENDING' AND expire < $1 AND program_id = $2)"
            ).bind(now).bind(pid).execute(&mut **tx).await.map_err(AppError::Database)?;
            sqlx::query(
                "DELETE FROM reservations WHERE status = 'PENDING' AND expire < $1 AND program_id = $2"
            ).bind(now).bind(pid).execute(&mut **tx).await.map_err(AppError::Database)?
                .rows_affected()
        }
        None => {
            sqlx::query(
                "DELETE FROM contacts WHERE reservation_id IN
                 (SELECT id FROM reservations WHERE status = 'PENDING' AND expire < $1)"
            ).bind(now).execute(&mut **tx).await.map_err(AppError::Database)?;
            sqlx::query(
                "DELETE FROM payments WHERE reservation_id IN
                 (SELECT id FROM reservations WHERE status = 'PENDING' AND expire < $1)"
            ).bind(now).execute(&mut **tx).await.map_err(AppError::Database)?;
            sqlx::query(
                "DELETE FROM reservations WHERE status = 'PENDING' AND expire < $1"
            ).bind(now).execute(&mut **tx).await.map_err(AppError::Database)?
                .rows_affected()
        }
    };
    Ok(rows_affected)
}

async fn insert_outbox(tx: &mut Transaction<'_, Postgres>, event: &OutboxEvent) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO outbox_events (id, event_type, recipient_user_id, reservation_id, program_id, message, status, error_message, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
    )
        .bind(&event.id).bind(&event.event_type).bind(&event.recipient_user_id)
        .bind(&event.reservation_id).bind(&event.program_id).bind(&event.message)
        .bind(&event.status).bind(&event.error_message).bind(event.created_at)
        .execute(&mut **tx).await.map_err(AppError::Database)?;
    Ok(())
}

#[async_trait]
impl ReservationRepository for PostgresReservationRepo {
    async fn reserve(
        &self,
        reservation: &Reservation,
        contact: &Contact,
        payment: &Payment,
        event: &OutboxEvent,
    ) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let now = Utc::now();

        // Serialize concurrent booking attempts on this program for the
        // duration of the check-and-insert.
        let locked = sqlx::query("SELECT id FROM programs WHERE id = $1 FOR UPDATE")
            .bind(&reservation.program_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;
        if locked.is_none() {
            return Err(AppError::NotFound("Program not found".to_string()));
        }

        reap_expired(&mut tx, Some(&reservation.program_id), now).await?;

        let conflicts = sqlx::query(
            "SELECT COUNT(*) as count FROM reservations
             WHERE program_id = $1 AND status != 'CANCELLED'
               AND (expire IS NULL OR expire > $2)
               AND end_time >= $3 AND start_time <= $4"
        )
            .bind(&reservation.program_id).bind(now)
            .bind(reservation.start_time).bind(reservation.end_time)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        if conflicts.get::<i64, _>("count") > 0 {
            return Err(AppError::Conflict("Slot already booked".to_string()));
        }

        let created = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (id, program_id, schedule_id, user_id, start_time, end_time, status, reason, reminder_sent, expire, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *"
        )
            .bind(&reservation.id).bind(&reservation.program_id).bind(&reservation.schedule_id)
            .bind(&reservation.user_id).bind(reservation.start_time).bind(reservation.end_time)
            .bind(&reservation.status).bind(&reservation.reason).bind(reservation.reminder_sent)
            .bind(reservation.expire).bind(reservation.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        sqlx::query(
            "INSERT INTO contacts (id, reservation_id, phone, email, message, created_at) VALUES ($1, $2, $3, $4, $5, $6)"
        )
            .bind(&contact.id).bind(&contact.reservation_id).bind(&contact.phone)
            .bind(&contact.email).bind(&contact.message).bind(contact.created_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        sqlx::query(
            "INSERT INTO payments (id, order_id, price, title, payment_key, paid_at, receipt_url, status, user_id, reservation_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        )
            .bind(&payment.id).bind(&payment.order_id).bind(payment.price).bind(&payment.title)
            .bind(&payment.payment_key).bind(payment.paid_at).bind(&payment.receipt_url)
            .bind(&payment.status).bind(&payment.user_id).bind(&payment.reservation_id)
            .bind(payment.created_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        insert_outbox(&mut tx, event).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn delete_expired_pending(&self, program_id: Option<&str>) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let purged = reap_expired(&mut tx, program_id, Utc::now()).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(purged)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReservationListItem>, AppError> {
        sqlx::query_as::<_, ReservationListItem>(
            "SELECT r.id, p.title, p.duration_min, r.status, r.start_time, r.created_at
             FROM reservations r JOIN programs p ON p.id = r.program_id
             WHERE r.user_id = $1 AND r.status != 'PENDING'
             ORDER BY r.created_at DESC LIMIT $2 OFFSET $3"
        )
            .bind(user_id).bind(limit).bind(offset)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn apply_decision(
        &self,
        reservation_id: &str,
        to_status: &str,
        reason: Option<&str>,
        event: &OutboxEvent,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let result = sqlx::query(
            "UPDATE reservations SET status = $1, reason = $2 WHERE id = $3 AND status = 'CONFIRMED'"
        )
            .bind(to_status).bind(reason).bind(reservation_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Reservation already decided".to_string()));
        }

        insert_outbox(&mut tx, event).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn complete_elapsed(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE reservations SET status = 'COMPLETED' WHERE status = 'PROGRESS' AND end_time < $1"
        )
            .bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn find_due_reminders(&self, until: DateTime<Utc>) -> Result<Vec<ReminderDue>, AppError> {
        sqlx::query_as::<_, ReminderDue>(
            "SELECT r.id as reservation_id, r.user_id, r.program_id, p.title, r.start_time
             FROM reservations r JOIN programs p ON p.id = r.program_id
             WHERE r.reminder_sent = FALSE AND r.status IN ('CONFIRMED', 'PROGRESS')
               AND r.start_time > $1 AND r.start_time <= $2"
        )
            .bind(Utc::now()).bind(until)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_reminder_sent(
        &self,
        reservation_id: &str,
        event: &OutboxEvent,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let result = sqlx::query(
            "UPDATE reservations SET reminder_sent = TRUE WHERE id = $1 AND reminder_sent = FALSE"
        )
            .bind(reservation_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Ok(());
        }

        insert_outbox(&mut tx, event).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
