use crate::domain::models::{
    contact::Contact,
    outbox::OutboxEvent,
    payment::{Payment, PaymentContext},
    program::Program,
    reservation::Reservation,
    schedule::{AvailableSchedule, WeeklySchedule},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ProgramRepository: Send + Sync {
    /// Creates the program and its weekly schedule in one transaction.
    async fn create_with_schedule(
        &self,
        program: &Program,
        weekly: &WeeklySchedule,
    ) -> Result<Program, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Program>, AppError>;
    async fn find_schedule(&self, program_id: &str) -> Result<Option<AvailableSchedule>, AppError>;
    /// Deletes the program and its schedule; only the owning mentor may.
    async fn delete(&self, mentor_user_id: &str, id: &str) -> Result<(), AppError>;
}

/// Row shape for a mentee's reservation history listing.
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
pub struct ReservationListItem {
    pub id: String,
    pub title: String,
    pub duration_min: i32,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A confirmed session whose reminder is due.
#[derive(Debug, sqlx::FromRow)]
pub struct ReminderDue {
    pub reservation_id: String,
    pub user_id: String,
    pub program_id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// The booking critical section, one transaction: reap expired
    /// PENDING rows of the program, lock the program row, check for a
    /// live overlapping reservation, then insert reservation + contact +
    /// payment + outbox row. Overlap is inclusive at the boundaries.
    ///
    /// Fails with `Conflict` when the slot is taken; the partial unique
    /// index on (program_id, start_time) backstops races and surfaces
    /// through the same 409 mapping.
    async fn reserve(
        &self,
        reservation: &Reservation,
        contact: &Contact,
        payment: &Payment,
        event: &OutboxEvent,
    ) -> Result<Reservation, AppError>;

    /// Hard-deletes expired unpaid reservations with their contact and
    /// payment rows. `program_id = None` sweeps globally. Returns the
    /// number of reservations purged.
    async fn delete_expired_pending(&self, program_id: Option<&str>) -> Result<u64, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, AppError>;

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReservationListItem>, AppError>;

    /// Mentor decision on a CONFIRMED reservation: PROGRESS on approval,
    /// CANCELLED (+reason) on rejection. Writes the outbox row in the
    /// same transaction. Guarded on the current status, so a repeated
    /// decision fails with `Conflict`.
    async fn apply_decision(
        &self,
        reservation_id: &str,
        to_status: &str,
        reason: Option<&str>,
        event: &OutboxEvent,
    ) -> Result<(), AppError>;

    /// Moves PROGRESS reservations whose end time has passed to COMPLETED.
    async fn complete_elapsed(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// Unreminded CONFIRMED/PROGRESS sessions starting before `until`.
    async fn find_due_reminders(&self, until: DateTime<Utc>) -> Result<Vec<ReminderDue>, AppError>;

    /// Marks the reminder sent and enqueues the outbox row, atomically.
    /// The flag is the sweep's idempotency key.
    async fn mark_reminder_sent(
        &self,
        reservation_id: &str,
        event: &OutboxEvent,
    ) -> Result<(), AppError>;
}

/// Result of the local confirmation commit.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfirmApply {
    /// This call moved the payment to COMPLETED.
    Applied,
    /// A concurrent verification already did; nothing to do.
    AlreadyCompleted,
}

/// Row shape for a mentee's purchase history listing.
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
pub struct PaymentListItem {
    pub id: String,
    pub order_id: String,
    pub price: i64,
    pub title: String,
    pub payment_key: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub receipt_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_context_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<PaymentContext>, AppError>;

    async fn find_context_by_key_for_user(
        &self,
        payment_key: &str,
        user_id: &str,
    ) -> Result<Option<PaymentContext>, AppError>;

    async fn find_by_reservation_id(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Payment>, AppError>;

    /// One transaction: payment → COMPLETED (paid_at, key, receipt),
    /// reservation → CONFIRMED with the soft lock cleared, plus the
    /// confirmation outbox row. Guarded on the payment still being
    /// PENDING; a lost race reports `AlreadyCompleted`.
    async fn mark_completed(
        &self,
        order_id: &str,
        payment_key: &str,
        receipt_url: Option<&str>,
        paid_at: DateTime<Utc>,
        event: &OutboxEvent,
    ) -> Result<ConfirmApply, AppError>;

    /// The compensating commit, one transaction: payment → REFUNDED,
    /// reservation → CANCELLED (+optional reason), plus the outbox row.
    /// Guarded on the payment still being COMPLETED.
    async fn mark_refunded(
        &self,
        payment_id: &str,
        reservation_id: &str,
        reason: Option<&str>,
        event: &OutboxEvent,
    ) -> Result<(), AppError>;

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentListItem>, AppError>;
}

#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn find_pending(&self, limit: i32) -> Result<Vec<OutboxEvent>, AppError>;
    async fn mark_status(
        &self,
        id: &str,
        status: &str,
        error_message: Option<String>,
    ) -> Result<(), AppError>;
}

/// Gateway confirm responses, as data. "Already processed" is a
/// legitimate race with a client-side retry, not an error.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    Approved {
        status: String,
        total_amount: i64,
        receipt_url: Option<String>,
    },
    AlreadyProcessed {
        total_amount: i64,
        receipt_url: Option<String>,
    },
    /// Gateway-side hiccup; the caller should re-drive verification.
    Transient { message: String },
    Rejected { code: String, message: String },
}

#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Cancelled,
    Rejected { code: String, message: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn confirm(
        &self,
        order_id: &str,
        amount: i64,
        payment_key: &str,
    ) -> Result<ConfirmOutcome, AppError>;

    async fn cancel(&self, payment_key: &str, reason: &str) -> Result<CancelOutcome, AppError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, event: &OutboxEvent) -> Result<(), AppError>;
}
