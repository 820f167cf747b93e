use crate::domain::models::{contact::Contact, outbox::OutboxEvent, payment::Payment, reservation::Reservation};
use crate::domain::ports::{ReminderDue, ReservationListItem, ReservationRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

pub struct SqliteReservationRepo {
    pool: SqlitePool,
}

impl SqliteReservationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Purges expired unpaid reservations and their dependent rows. A purged
/// PENDING booking was never confirmed, so it vanishes outright instead
/// of being soft-cancelled.
async fn reap_expired(
    tx: &mut Transaction<'_, Sqlite>,
    program_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<u64, AppError> {
    let scope = match program_id {
        Some(_) => " AND program_id = ?",
        None => "",
    };

    let select = format!(
        "SELECT id FROM reservations WHERE status = 'PENDING' AND expire < ?{}",
        scope
    );

    let del_contacts = format!("DELETE FROM contacts WHERE reservation_id IN ({})", select);
    let mut q = sqlx::query(&del_contacts).bind(now);
    if let Some(pid) = program_id { q = q.bind(pid); }
    q.execute(&mut **tx).await.map_err(AppError::Database)?;

    let del_payments = format!("DELETE FROM payments WHERE reservation_id IN ({})", select);
    let mut q = sqlx::query(&del_payments).bind(now);
    if let Some(pid) = program_id { q = q.bind(pid); }
    q.execute(&mut **tx).await.map_err(AppError::Database)?;

    let del_reservations = format!(
        "DELETE FROM reservations WHERE status = 'PENDING' AND expire < ?{}",
        scope
    );
    let mut q = sqlx::query(&del_reservations).bind(now);
    if let Some(pid) = program_id { q = q.bind(pid); }
    let result = q.execute(&mut **tx).await.map_err(AppError::Database)?;

    Ok(result.rows_affected())
}

async fn insert_outbox(tx: &mut Transaction<'_, Sqlite>, event: &OutboxEvent) -> Result<(), AppError> {
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

#[async_trait]
impl ReservationRepository for SqliteReservationRepo {
    async fn reserve(
        &self,
        reservation: &Reservation,
        contact: &Contact,
        payment: &Payment,
        event: &OutboxEvent,
    ) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let now = Utc::now();

        reap_expired(&mut tx, Some(&reservation.program_id), now).await?;

        // SQLite serializes writers, so the reap above already holds the
        // write lock for the rest of the check-and-insert.
        let conflicts = sqlx::query(
            "SELECT COUNT(*) as count FROM reservations
             WHERE program_id = ? AND status != 'CANCELLED'
               AND (expire IS NULL OR expire > ?)
               AND end_time >= ? AND start_time <= ?"
        )
            .bind(&reservation.program_id).bind(now)
            .bind(reservation.start_time).bind(reservation.end_time)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        if conflicts.get::<i64, _>("count") > 0 {
            return Err(AppError::Conflict("Slot already booked".to_string()));
        }

        let created = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (id, program_id, schedule_id, user_id, start_time, end_time, status, reason, reminder_sent, expire, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&reservation.id).bind(&reservation.program_id).bind(&reservation.schedule_id)
            .bind(&reservation.user_id).bind(reservation.start_time).bind(reservation.end_time)
            .bind(&reservation.status).bind(&reservation.reason).bind(reservation.reminder_sent)
            .bind(reservation.expire).bind(reservation.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        sqlx::query(
            "INSERT INTO contacts (id, reservation_id, phone, email, message, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
            .bind(&contact.id).bind(&contact.reservation_id).bind(&contact.phone)
            .bind(&contact.email).bind(&contact.message).bind(contact.created_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        sqlx::query(
            "INSERT INTO payments (id, order_id, price, title, payment_key, paid_at, receipt_url, status, user_id, reservation_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
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
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?")
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
             WHERE r.user_id = ? AND r.status != 'PENDING'
             ORDER BY r.created_at DESC LIMIT ? OFFSET ?"
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
            "UPDATE reservations SET status = ?, reason = ? WHERE id = ? AND status = 'CONFIRMED'"
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
            "UPDATE reservations SET status = 'COMPLETED' WHERE status = 'PROGRESS' AND end_time < ?"
        )
            .bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn find_due_reminders(&self, until: DateTime<Utc>) -> Result<Vec<ReminderDue>, AppError> {
        sqlx::query_as::<_, ReminderDue>(
            "SELECT r.id as reservation_id, r.user_id, r.program_id, p.title, r.start_time
             FROM reservations r JOIN programs p ON p.id = r.program_id
             WHERE r.reminder_sent = 0 AND r.status IN ('CONFIRMED', 'PROGRESS')
               AND r.start_time > ? AND r.start_time <= ?"
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
            "UPDATE reservations SET reminder_sent = 1 WHERE id = ? AND reminder_sent = 0"
        )
            .bind(reservation_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        // Someone else got there first; don't duplicate the reminder.
        if result.rows_affected() == 0 {
            return Ok(());
        }

        insert_outbox(&mut tx, event).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
