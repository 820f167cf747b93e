pub mod health;
pub mod payment;
pub mod program;
pub mod reservation;
