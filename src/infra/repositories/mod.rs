pub mod postgres_outbox_repo;
pub mod postgres_payment_repo;
pub mod postgres_program_repo;
pub mod postgres_reservation_repo;
pub mod sqlite_outbox_repo;
pub mod sqlite_payment_repo;
pub mod sqlite_program_repo;
pub mod sqlite_reservation_repo;
