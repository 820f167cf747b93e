pub mod contact;
pub mod outbox;
pub mod payment;
pub mod program;
pub mod reservation;
pub mod schedule;
