pub mod health;
pub mod sessions;
pub mod wsroute;

use crate::metrics;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(sessions::list_sessions)
        .service(sessions::get_session)
        .service(sessions::close_session)
        .route(wsroute::POSE_WS_PATH, web::get().to(wsroute::pose_ws))
        .route(wsroute::YOGA_WS_PATH, web::get().to(wsroute::pose_ws))
        .route("/metrics", web::get().to(metrics::serve_metrics));
}
