use axum::{
    routing::{get, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::notification::{
    mark_all_notifications_read, mark_notification_read, show_my_notifications,
};

pub fn build_notification_routers() -> Router<AppRegistry> {
    let notifications_routers = Router::new()
        .route("/", get(show_my_notifications))
        .route("/read-all", put(mark_all_notifications_read))
        .route("/:notification_id/read", put(mark_notification_read));
    Router::new().nest("/notifications", notifications_routers)
}
