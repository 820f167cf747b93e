use crate::domain::models::contact::Contact;
use crate::domain::models::outbox::{
    OutboxEvent, EVENT_BOOKING_CREATED, EVENT_RESERVATION_APPROVED, EVENT_RESERVATION_REJECTED,
};
use crate::domain::models::payment::Payment;
use crate::domain::models::reservation::{NewReservationParams, Reservation, ReservationStatus};
use crate::domain::ports::{
    CancelOutcome, PaymentGateway, PaymentRepository, ProgramRepository, ReservationRepository,
};
use crate::domain::services::availability::is_within_schedule;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// What the client needs to open a gateway checkout.
#[derive(Debug)]
pub struct BookingReceipt {
    pub reservation_id: String,
    pub order_id: String,
    pub amount: i64,
    pub order_name: String,
}

pub struct CreateReservation {
    pub program_id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub phone: String,
    pub email: String,
    pub message: String,
}

/// Orchestrates the booking lifecycle. Slot validation happens against a
/// snapshot of the schedule; the conflict check and inserts run inside
/// the repository's single reserve transaction.
pub struct ReservationService {
    programs: Arc<dyn ProgramRepository>,
    reservations: Arc<dyn ReservationRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    lock_minutes: i64,
}

impl ReservationService {
    pub fn new(
        programs: Arc<dyn ProgramRepository>,
        reservations: Arc<dyn ReservationRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        lock_minutes: i64,
    ) -> Self {
        Self {
            programs,
            reservations,
            payments,
            gateway,
            lock_minutes,
        }
    }

    pub async fn create(&self, req: CreateReservation) -> Result<BookingReceipt, AppError> {
        if req.start_time >= req.end_time {
            return Err(AppError::Validation("startTime must precede endTime".into()));
        }
        if req.start_time < Utc::now() {
            return Err(AppError::Validation("Cannot book in the past".into()));
        }

        let program = self
            .programs
            .find_by_id(&req.program_id)
            .await?
            .ok_or(AppError::NotFound("Program not found".into()))?;

        let schedule = self
            .programs
            .find_schedule(&program.id)
            .await?
            .ok_or(AppError::NotFound("Program has no schedule".into()))?;

        if !is_within_schedule(&schedule.weekly, req.start_time, req.end_time) {
            return Err(AppError::Validation(
                "The selected time is outside the mentor's availability".into(),
            ));
        }

        let reservation = Reservation::new(NewReservationParams {
            program_id: program.id.clone(),
            schedule_id: schedule.id.clone(),
            user_id: req.user_id.clone(),
            start_time: req.start_time,
            end_time: req.end_time,
            lock_minutes: self.lock_minutes,
        });

        let contact = Contact::new(
            reservation.id.clone(),
            req.phone,
            req.email,
            req.message,
        );

        let payment = Payment::new(
            reservation.id.clone(),
            req.user_id,
            program.price,
            program.title.clone(),
        );

        let event = OutboxEvent::new(
            EVENT_BOOKING_CREATED,
            program.mentor_user_id.clone(),
            reservation.id.clone(),
            program.id.clone(),
            format!("A mentoring session for \"{}\" has been requested.", program.title),
        );

        let created = self
            .reservations
            .reserve(&reservation, &contact, &payment, &event)
            .await?;

        info!(
            reservation_id = %created.id,
            order_id = %payment.order_id,
            program_id = %program.id,
            "reservation created"
        );

        Ok(BookingReceipt {
            reservation_id: created.id,
            order_id: payment.order_id,
            amount: payment.price,
            order_name: payment.title,
        })
    }

    /// Mentor approval or rejection of a paid (CONFIRMED) reservation.
    /// Rejection of a paid booking runs the compensating refund so the
    /// reservation and payment never disagree about money.
    pub async fn decide(
        &self,
        mentor_user_id: &str,
        reservation_id: &str,
        approved: bool,
        reason: Option<String>,
    ) -> Result<(), AppError> {
        let reservation = self
            .reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or(AppError::NotFound("Reservation not found".into()))?;

        let program = self
            .programs
            .find_by_id(&reservation.program_id)
            .await?
            .ok_or(AppError::NotFound("Program not found".into()))?;

        if program.mentor_user_id != mentor_user_id {
            return Err(AppError::Forbidden(
                "Only the program's mentor can decide on this reservation".into(),
            ));
        }

        match reservation.status() {
            Some(ReservationStatus::Confirmed) => {}
            Some(ReservationStatus::Progress) => {
                return Err(AppError::Conflict("Reservation already approved".into()))
            }
            Some(ReservationStatus::Cancelled) => {
                return Err(AppError::Conflict("Reservation already cancelled".into()))
            }
            _ => {
                return Err(AppError::Conflict(
                    "Only a paid reservation can be decided on".into(),
                ))
            }
        }

        if approved {
            let event = OutboxEvent::new(
                EVENT_RESERVATION_APPROVED,
                reservation.user_id.clone(),
                reservation.id.clone(),
                program.id.clone(),
                format!("Your \"{}\" mentoring session was approved.", program.title),
            );
            self.reservations
                .apply_decision(
                    &reservation.id,
                    ReservationStatus::Progress.as_str(),
                    None,
                    &event,
                )
                .await?;
            info!(reservation_id = %reservation.id, "reservation approved");
            return Ok(());
        }

        // Rejection: the mentee already paid, so refund first.
        let payment = self
            .payments
            .find_by_reservation_id(&reservation.id)
            .await?
            .ok_or(AppError::NotFound("Payment record not found".into()))?;

        let payment_key = payment
            .payment_key
            .as_deref()
            .ok_or(AppError::InternalWithMsg(
                "Confirmed reservation has no payment key".into(),
            ))?;

        let reject_reason = reason.unwrap_or_else(|| "Rejected by mentor".to_string());

        match self
            .gateway
            .cancel(payment_key, &reject_reason)
            .await?
        {
            CancelOutcome::Cancelled => {}
            CancelOutcome::Rejected { code, message } => {
                info!(%code, %message, reservation_id = %reservation.id, "gateway refused refund on rejection");
                return Err(AppError::RefundFailed);
            }
        }

        let event = OutboxEvent::new(
            EVENT_RESERVATION_REJECTED,
            reservation.user_id.clone(),
            reservation.id.clone(),
            program.id.clone(),
            format!("Your \"{}\" mentoring session was declined.", program.title),
        );

        self.payments
            .mark_refunded(&payment.id, &reservation.id, Some(&reject_reason), &event)
            .await?;

        info!(reservation_id = %reservation.id, "reservation rejected and refunded");
        Ok(())
    }
}
