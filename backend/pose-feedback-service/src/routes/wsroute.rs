use crate::error::AppError;
use crate::session::{CloseReason, SessionId};
use crate::state::AppState;
use crate::websocket::PoseSocket;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

/// Path segment that asks the server to pick the session id.
const GENERATE_ID: &str = "new";

/// Primary WebSocket path.
pub const POSE_WS_PATH: &str = "/ws/pose/{session_id}";
/// Path served to clients built against the yoga coach frontend.
pub const YOGA_WS_PATH: &str = "/ws/yoga/{session_id}";

/// Open a pose session over WebSocket.
///
/// 409 if the id is already live, 503 at the session limit.
pub async fn pose_ws(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let raw = path.into_inner();
    let id = if raw == GENERATE_ID {
        SessionId::generate()
    } else {
        SessionId::parse(&raw)
            .ok_or_else(|| AppError::BadRequest(format!("invalid session id {raw:?}")))?
    };

    // Reject non-upgrade requests before a session is created for them.
    ws::handshake(&req)?;

    let (handle, outbound) = state.registry.register(id).map_err(AppError::from)?;
    tracing::info!(session_id = %handle.id(), "WebSocket session opened");

    ws::start(PoseSocket::new(handle.clone(), outbound), &req, stream).map_err(|e| {
        handle.close(CloseReason::TransportFailure);
        e
    })
}
