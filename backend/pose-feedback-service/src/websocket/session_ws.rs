use super::message_types::{OutboundMessage, WsInboundEvent};
use crate::metrics;
use crate::session::{CloseReason, SessionHandle, SubmitError};
use actix::prelude::*;
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// WebSocket actor bridging one client connection to its session worker.
///
/// Inbound frames are queued on the session without waiting; results come
/// back through the session's outbound channel in sequence order.
pub struct PoseSocket {
    handle: SessionHandle,
    outbound: Option<mpsc::Receiver<OutboundMessage>>,
    hb: Instant,
}

impl PoseSocket {
    pub fn new(handle: SessionHandle, outbound: mpsc::Receiver<OutboundMessage>) -> Self {
        Self {
            handle,
            outbound: Some(outbound),
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(session_id = %act.handle.id(), "WebSocket heartbeat failed, disconnecting");
                act.handle.close(CloseReason::TransportFailure);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &OutboundMessage) {
        match serde_json::to_string(message) {
            Ok(json) => ctx.text(json),
            Err(e) => tracing::warn!(
                session_id = %self.handle.id(),
                error = %e,
                "Failed to serialize outbound message"
            ),
        }
    }

    fn handle_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let event = match serde_json::from_str::<WsInboundEvent>(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(session_id = %self.handle.id(), error = %e, "Invalid inbound message");
                self.send(ctx, &OutboundMessage::error(format!("invalid message: {e}")));
                return;
            }
        };

        match event {
            WsInboundEvent::PoseFrame { data } => match self.handle.submit_frame(data) {
                Ok(()) => {}
                Err(SubmitError::Backlog) => {
                    metrics::frame_rejected();
                    tracing::debug!(session_id = %self.handle.id(), "Frame rejected, backlog full");
                    self.send(ctx, &OutboundMessage::error(SubmitError::Backlog.to_string()));
                }
                Err(SubmitError::Closed) => {
                    self.send(ctx, &OutboundMessage::error(SubmitError::Closed.to_string()));
                }
            },
            WsInboundEvent::Ping => self.send(ctx, &OutboundMessage::Pong),
            other => {
                self.send(
                    ctx,
                    &OutboundMessage::error(format!(
                        "{} messages are not supported by this service",
                        other.kind()
                    )),
                );
            }
        }
    }
}

impl Actor for PoseSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!(session_id = %self.handle.id(), "WebSocket connected");
        self.hb(ctx);
        if let Some(outbound) = self.outbound.take() {
            ctx.add_stream(ReceiverStream::new(outbound));
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!(session_id = %self.handle.id(), "WebSocket disconnected");
        self.handle.close(CloseReason::ClientDisconnected);
    }
}

/// Results from the session worker.
impl StreamHandler<OutboundMessage> for PoseSocket {
    fn handle(&mut self, message: OutboundMessage, ctx: &mut Self::Context) {
        self.send(ctx, &message);
    }

    /// The worker has exited; close the socket with its reason.
    fn finished(&mut self, ctx: &mut Self::Context) {
        let description = self
            .handle
            .close_reason()
            .unwrap_or(CloseReason::TransportFailure)
            .to_string();
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Normal,
            description: Some(description),
        }));
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for PoseSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                self.handle_text(&text, ctx);
            }
            Ok(ws::Message::Binary(_)) => {
                self.hb = Instant::now();
                self.send(ctx, &OutboundMessage::error("binary messages are not supported"));
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!(session_id = %self.handle.id(), ?reason, "Client closed WebSocket");
                self.handle.close(CloseReason::ClientRequest);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                tracing::warn!(session_id = %self.handle.id(), error = %e, "WebSocket protocol error");
                self.handle.close(CloseReason::TransportFailure);
                ctx.stop();
            }
        }
    }
}
