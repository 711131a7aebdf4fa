use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Returned by the classifier when no angles could be measured.
pub const UNKNOWN_POSE: &str = "unknown";

/// Returned by the classifier when angles exist but no rule matched.
pub const GENERAL_POSE: &str = "general_pose";

/// Tracked joints.
///
/// Declaration order is the joint enumeration order: corrections are emitted
/// in this order, never by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftElbow,
    RightElbow,
    LeftKnee,
    RightKnee,
}

impl Joint {
    pub const ALL: [Joint; 4] = [
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftKnee,
        Joint::RightKnee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
        }
    }

    /// Human readable name used in correction text.
    pub fn label(&self) -> &'static str {
        match self {
            Joint::LeftElbow => "left elbow",
            Joint::RightElbow => "right elbow",
            Joint::LeftKnee => "left knee",
            Joint::RightKnee => "right knee",
        }
    }

    /// (proximal, vertex, distal) landmark indices defining the joint.
    pub fn landmark_indices(&self) -> (usize, usize, usize) {
        match self {
            // shoulder, elbow, wrist
            Joint::LeftElbow => (11, 13, 15),
            Joint::RightElbow => (12, 14, 16),
            // hip, knee, ankle
            Joint::LeftKnee => (23, 25, 27),
            Joint::RightKnee => (24, 26, 28),
        }
    }
}

/// Measured joint angles in degrees. Joints that could not be measured are
/// absent, never zero.
pub type JointAngleSet = BTreeMap<Joint, f64>;

/// Per-frame feedback for a recognized (or generic) pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub detected_pose: String,
    pub quality_score: f64,
    pub corrections: Vec<String>,
    pub joint_angles: JointAngleSet,
    pub timestamp: DateTime<Utc>,
}

/// Result of pushing one frame through the pipeline.
///
/// Every variant is a value; nothing here terminates a session.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Feedback(FeedbackResult),
    /// The extractor saw no person. Informational, not an error.
    NoPoseDetected { message: String },
    /// This one frame could not be processed.
    ProcessingError { message: String },
}

impl FrameOutcome {
    /// Label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameOutcome::Feedback(_) => "feedback",
            FrameOutcome::NoPoseDetected { .. } => "no_pose",
            FrameOutcome::ProcessingError { .. } => "error",
        }
    }
}
