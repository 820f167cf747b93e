use crate::config::Config;
use crate::domain::ports::{
    Notifier, OutboxRepository, PaymentGateway, PaymentRepository, ProgramRepository,
    ReservationRepository,
};
use crate::domain::services::payment_service::PaymentService;
use crate::domain::services::reservation_service::ReservationService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub program_repo: Arc<dyn ProgramRepository>,
    pub reservation_repo: Arc<dyn ReservationRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub outbox_repo: Arc<dyn OutboxRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub reservation_service: Arc<ReservationService>,
    pub payment_service: Arc<PaymentService>,
}
