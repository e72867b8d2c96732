use super::{
    health::build_health_check_routers, notification::build_notification_routers,
    reservation::build_reservation_routers,
};
use axum::Router;
use registry::AppRegistry;

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_health_check_routers())
        .merge(build_reservation_routers())
        .merge(build_notification_routers());
    Router::new().nest("/api/v1", router)
}
