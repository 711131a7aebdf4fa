//! Pose Feedback Service Library
//!
//! Streams body landmarks over WebSocket and answers each frame with the
//! detected pose, a quality score and corrective instructions.
//!
//! Frame path: `websocket` -> `session` worker -> `pipeline`
//! (`kinematics` -> `pose::classifier` -> `pose::feedback`) -> back out
//! through the same session.

pub mod config;
pub mod error;
pub mod extractor;
pub mod kinematics;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod pose;
pub mod routes;
pub mod session;
pub mod state;
pub mod websocket;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::extractor::ExtractionGate;
    use crate::kinematics::KinematicCalculator;
    use crate::models::{Joint, Landmark, LandmarkSet, LANDMARK_COUNT};
    use crate::pipeline::FramePipeline;
    use crate::pose::PoseCatalog;

    const ARM: f64 = 0.1;

    fn vertex_base(joint: Joint) -> (f64, f64) {
        match joint {
            Joint::LeftElbow => (0.3, 0.3),
            Joint::RightElbow => (0.7, 0.3),
            Joint::LeftKnee => (0.3, 0.7),
            Joint::RightKnee => (0.7, 0.7),
        }
    }

    /// Full 33-point frame whose joints bend to the given angles. Joints not
    /// listed are straight.
    pub fn pose_landmarks(angles: &[(Joint, f64)]) -> LandmarkSet {
        let mut points: Vec<Landmark> = (0..LANDMARK_COUNT)
            .map(|i| Landmark::new(i as u32, 0.5, 0.5, 0.0, 0.99))
            .collect();

        for joint in Joint::ALL {
            let degrees = angles
                .iter()
                .find(|(j, _)| *j == joint)
                .map(|(_, a)| *a)
                .unwrap_or(180.0);
            let theta = degrees.to_radians();
            let (vx, vy) = vertex_base(joint);
            let (proximal, vertex, distal) = joint.landmark_indices();

            points[proximal].x = vx;
            points[proximal].y = vy - ARM;
            points[vertex].x = vx;
            points[vertex].y = vy;
            points[distal].x = vx + ARM * theta.sin();
            points[distal].y = vy - ARM * theta.cos();
        }

        LandmarkSet::new(points)
    }

    /// Pipeline with no server-side extractor.
    pub fn pipeline() -> FramePipeline {
        FramePipeline::new(
            PoseCatalog::shared(),
            KinematicCalculator::default(),
            ExtractionGate::unavailable(),
        )
    }
}
