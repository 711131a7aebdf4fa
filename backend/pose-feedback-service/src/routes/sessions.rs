use crate::error::{AppError, AppResult};
use crate::session::SessionId;
use crate::state::AppState;
use actix_web::{delete, get, web, HttpResponse};

fn session_id(raw: &str) -> AppResult<SessionId> {
    SessionId::parse(raw).ok_or_else(|| AppError::BadRequest(format!("invalid session id {raw:?}")))
}

#[get("/sessions")]
pub async fn list_sessions(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.registry.snapshot())
}

#[get("/sessions/{session_id}")]
pub async fn get_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = session_id(&path)?;
    let handle = state.registry.lookup(&id)?;
    Ok(HttpResponse::Ok().json(handle.snapshot()))
}

/// Close a session. Closing an unknown or already closed id is not an error.
#[delete("/sessions/{session_id}")]
pub async fn close_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = session_id(&path)?;
    if let Some(handle) = state.registry.remove(&id) {
        handle.closed().await;
    }
    Ok(HttpResponse::NoContent().finish())
}
