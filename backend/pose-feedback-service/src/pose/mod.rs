//! Pose recognition over joint angles: reference table, classifier and
//! corrective feedback. Everything here is stateless and safe to share.

pub mod catalog;
pub mod classifier;
pub mod feedback;

pub use catalog::{PoseCatalog, PoseReference};
pub use classifier::classify;
pub use feedback::{assess, Assessment};
