use crate::state::AppState;
use actix_web::{get, web, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub services: ServiceHealth,
    pub sessions: SessionHealth,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub extractor: bool,
    pub pose_engine: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionHealth {
    pub live: usize,
    pub max: usize,
    pub extractions_in_flight: usize,
    pub extractions_max: usize,
}

/// Degraded means image frames will fail; client-side landmarks still work.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let extraction = state.registry.pipeline().extraction();
    let extractor = extraction.is_ready();

    HttpResponse::Ok().json(HealthResponse {
        status: if extractor { "healthy" } else { "degraded" },
        services: ServiceHealth {
            extractor,
            pose_engine: true,
        },
        sessions: SessionHealth {
            live: state.registry.live_count(),
            max: state.registry.settings().max_sessions,
            extractions_in_flight: extraction.in_flight(),
            extractions_max: extraction.max_in_flight(),
        },
    })
}
