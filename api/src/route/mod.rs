pub mod health;
pub mod notification;
pub mod reservation;
pub mod v1;
