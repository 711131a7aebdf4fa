//! WebSocket transport for pose sessions.

pub mod message_types;
pub mod session_ws;

pub use message_types::{FrameFeedback, OutboundMessage, WsInboundEvent};
pub use session_ws::PoseSocket;
