pub mod notification;
pub mod reservation;
