pub mod landmark;
pub mod pose;

pub use landmark::{Landmark, LandmarkError, LandmarkSet, LANDMARK_COUNT};
pub use pose::{
    FeedbackResult, FrameOutcome, Joint, JointAngleSet, GENERAL_POSE, UNKNOWN_POSE,
};
