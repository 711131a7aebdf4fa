use crate::models::{FeedbackResult, FrameOutcome};
use crate::pipeline::FramePayload;
use crate::session::{CloseReason, SessionId};
use serde::{Deserialize, Serialize};

/// Inbound WebSocket events from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsInboundEvent {
    PoseFrame {
        data: FramePayload,
    },

    /// Conversational assistant traffic; not handled by this service.
    ChatMessage {
        #[serde(default)]
        data: serde_json::Value,
    },

    /// Biometric scoring traffic; not handled by this service.
    ConsciousnessData {
        #[serde(default)]
        data: serde_json::Value,
    },

    Ping,
}

impl WsInboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WsInboundEvent::PoseFrame { .. } => "pose_frame",
            WsInboundEvent::ChatMessage { .. } => "chat_message",
            WsInboundEvent::ConsciousnessData { .. } => "consciousness_data",
            WsInboundEvent::Ping => "ping",
        }
    }
}

/// Feedback for one frame, tagged with the frame's session sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameFeedback {
    pub sequence: u64,
    #[serde(flatten)]
    pub result: FeedbackResult,
}

/// Outbound WebSocket events from server to client, as `{type, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
    SessionStarted { session_id: String },
    PoseCorrection(FrameFeedback),
    NoPoseDetected { sequence: u64, message: String },
    ProcessingError { sequence: u64, error: String },
    Error { error: String },
    SessionClosed { reason: CloseReason },
    Pong,
}

impl OutboundMessage {
    pub fn session_started(id: &SessionId) -> Self {
        OutboundMessage::SessionStarted {
            session_id: id.to_string(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        OutboundMessage::Error {
            error: error.into(),
        }
    }

    pub fn from_outcome(sequence: u64, outcome: FrameOutcome) -> Self {
        match outcome {
            FrameOutcome::Feedback(result) => {
                OutboundMessage::PoseCorrection(FrameFeedback { sequence, result })
            }
            FrameOutcome::NoPoseDetected { message } => {
                OutboundMessage::NoPoseDetected { sequence, message }
            }
            FrameOutcome::ProcessingError { message } => OutboundMessage::ProcessingError {
                sequence,
                error: message,
            },
        }
    }

    /// Sequence number of the frame this message answers, if any.
    pub fn sequence(&self) -> Option<u64> {
        match self {
            OutboundMessage::PoseCorrection(feedback) => Some(feedback.sequence),
            OutboundMessage::NoPoseDetected { sequence, .. }
            | OutboundMessage::ProcessingError { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pose_frame_with_landmarks() {
        let raw = json!({
            "type": "pose_frame",
            "data": {"landmarks": [{"id": 0, "x": 0.5, "y": 0.5, "z": 0.0, "visibility": 0.9}]}
        });
        let event: WsInboundEvent = serde_json::from_value(raw).unwrap();
        let WsInboundEvent::PoseFrame {
            data: FramePayload::Landmarks { landmarks: Some(set) },
        } = event
        else {
            panic!("expected landmark frame");
        };
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_parse_pose_frame_with_data_url() {
        let raw = r#"{"type":"pose_frame","data":"data:image/jpeg;base64,AAAA"}"#;
        let event: WsInboundEvent = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            event,
            WsInboundEvent::PoseFrame {
                data: FramePayload::Encoded(_)
            }
        ));
    }

    #[test]
    fn test_parse_other_kinds() {
        let chat: WsInboundEvent =
            serde_json::from_str(r#"{"type":"chat_message","data":{"message":"hi"}}"#).unwrap();
        assert_eq!(chat.kind(), "chat_message");

        let ping: WsInboundEvent = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping.kind(), "ping");

        assert!(serde_json::from_str::<WsInboundEvent>(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn test_outbound_envelope_shape() {
        let message = OutboundMessage::NoPoseDetected {
            sequence: 4,
            message: "nobody".into(),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"type": "no_pose_detected", "data": {"sequence": 4, "message": "nobody"}})
        );

        let closed = OutboundMessage::SessionClosed {
            reason: CloseReason::Shutdown,
        };
        assert_eq!(
            serde_json::to_value(&closed).unwrap(),
            json!({"type": "session_closed", "data": {"reason": "shutdown"}})
        );

        assert_eq!(
            serde_json::to_value(OutboundMessage::Pong).unwrap(),
            json!({"type": "pong"})
        );
    }

    #[test]
    fn test_pose_correction_flattens_result() {
        let result = FeedbackResult {
            detected_pose: "tree".into(),
            quality_score: 88.5,
            corrections: vec!["Great form! Keep holding the pose.".into()],
            joint_angles: Default::default(),
            timestamp: chrono::Utc::now(),
        };
        let value = serde_json::to_value(OutboundMessage::from_outcome(
            7,
            FrameOutcome::Feedback(result),
        ))
        .unwrap();

        assert_eq!(value["type"], "pose_correction");
        assert_eq!(value["data"]["sequence"], 7);
        assert_eq!(value["data"]["detected_pose"], "tree");
        assert_eq!(value["data"]["quality_score"], 88.5);
    }
}
