use axum::{
    routing::{delete, get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::reservation::{
    cancel_reservation, check_reminders, confirm_reservation, register_reservation,
    show_all_reservations, show_available_seats, show_my_reservations,
};

pub fn build_reservation_routers() -> Router<AppRegistry> {
    let reservations_routers = Router::new()
        .route("/", post(register_reservation))
        .route("/available", get(show_available_seats))
        .route("/my", get(show_my_reservations))
        .route("/all", get(show_all_reservations))
        .route("/check-reminders", post(check_reminders))
        .route("/:reservation_id/confirm", put(confirm_reservation))
        .route("/:reservation_id", delete(cancel_reservation));
    Router::new().nest("/reservations", reservations_routers)
}
