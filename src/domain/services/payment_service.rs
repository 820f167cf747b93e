use crate::domain::models::outbox::{OutboxEvent, EVENT_BOOKING_CANCELLED, EVENT_BOOKING_CONFIRMED};
use crate::domain::models::payment::PaymentStatus;
use crate::domain::models::reservation::ReservationStatus;
use crate::domain::ports::{
    CancelOutcome, ConfirmApply, ConfirmOutcome, PaymentGateway, PaymentRepository,
};
use crate::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a verification attempt surfaced to the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Payment confirmed; reservation and payment committed together.
    Done { receipt_url: Option<String> },
    /// The gateway is having a moment; rows stay PENDING, re-drive later.
    Pending { should_retry: bool },
}

/// Reconciles the external gateway's view of a payment with local state.
/// The gateway round trip happens before the local commit; no row lock is
/// held across the network call.
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(payments: Arc<dyn PaymentRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { payments, gateway }
    }

    pub async fn verify(
        &self,
        order_id: &str,
        claimed_price: i64,
        payment_key: &str,
    ) -> Result<VerifyOutcome, AppError> {
        let ctx = self
            .payments
            .find_context_by_order_id(order_id)
            .await?
            .ok_or(AppError::NotFound("Payment not found".into()))?;

        // Defense against a tampered client-side amount.
        if ctx.price != claimed_price {
            return Err(AppError::AmountMismatch);
        }

        // A repeat of an already-reconciled order is a success, not a
        // second charge. Hand back the stored receipt.
        if ctx.payment_status() == Some(PaymentStatus::Completed) {
            info!(%order_id, "payment already completed locally, skipping gateway");
            return Ok(VerifyOutcome::Done {
                receipt_url: ctx.receipt_url,
            });
        }

        let outcome = self.gateway.confirm(order_id, claimed_price, payment_key).await?;

        let (total_amount, receipt_url) = match outcome {
            ConfirmOutcome::Approved {
                status,
                total_amount,
                receipt_url,
            } => {
                if status != "DONE" {
                    warn!(%order_id, %status, "gateway returned a non-final status");
                    return Err(AppError::PaymentNotCompleted);
                }
                (total_amount, receipt_url)
            }
            ConfirmOutcome::AlreadyProcessed {
                total_amount,
                receipt_url,
            } => {
                info!(%order_id, "gateway reports payment already processed, reconciling");
                (total_amount, receipt_url)
            }
            ConfirmOutcome::Transient { message } => {
                warn!(%order_id, %message, "gateway transient failure, caller should retry");
                return Ok(VerifyOutcome::Pending { should_retry: true });
            }
            ConfirmOutcome::Rejected { code, message } => {
                warn!(%order_id, %code, %message, "gateway rejected confirmation");
                return Err(AppError::PaymentConfirmFailed(message));
            }
        };

        // The gateway's reported total must match too, even on success.
        if total_amount != claimed_price {
            warn!(%order_id, total_amount, claimed_price, "gateway-reported amount mismatch");
            return Err(AppError::AmountMismatch);
        }

        let event = OutboxEvent::new(
            EVENT_BOOKING_CONFIRMED,
            ctx.mentor_user_id.clone(),
            ctx.reservation_id.clone(),
            ctx.program_id.clone(),
            format!("A mentoring session for \"{}\" has been paid for.", ctx.title),
        );

        match self
            .payments
            .mark_completed(
                order_id,
                payment_key,
                receipt_url.as_deref(),
                Utc::now(),
                &event,
            )
            .await?
        {
            ConfirmApply::Applied => {
                info!(%order_id, reservation_id = %ctx.reservation_id, "payment confirmed");
            }
            ConfirmApply::AlreadyCompleted => {
                info!(%order_id, "lost the confirmation race, already completed");
            }
        }

        Ok(VerifyOutcome::Done { receipt_url })
    }

    /// The compensating flow: refund the charge and cancel the booking in
    /// one commit. A session that already ran cannot be refunded.
    pub async fn cancel_and_refund(
        &self,
        user_id: &str,
        payment_key: &str,
    ) -> Result<(), AppError> {
        let ctx = self
            .payments
            .find_context_by_key_for_user(payment_key, user_id)
            .await?
            .ok_or(AppError::NotFound(
                "Payment not found or not owned by this user".into(),
            ))?;

        if ctx.reservation_status() == Some(ReservationStatus::Completed) {
            return Err(AppError::AlreadyCompleted);
        }

        match self
            .gateway
            .cancel(payment_key, "Requested by the customer")
            .await?
        {
            CancelOutcome::Cancelled => {}
            CancelOutcome::Rejected { code, message } => {
                warn!(%payment_key, %code, %message, "gateway refused cancellation");
                return Err(AppError::RefundFailed);
            }
        }

        let event = OutboxEvent::new(
            EVENT_BOOKING_CANCELLED,
            ctx.mentor_user_id.clone(),
            ctx.reservation_id.clone(),
            ctx.program_id.clone(),
            format!("The \"{}\" mentoring session was cancelled and refunded.", ctx.title),
        );

        self.payments
            .mark_refunded(&ctx.id, &ctx.reservation_id, None, &event)
            .await?;

        info!(payment_id = %ctx.id, reservation_id = %ctx.reservation_id, "payment refunded");
        Ok(())
    }
}
