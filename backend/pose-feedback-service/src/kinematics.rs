//! Joint angle computation from a single landmark frame.
//!
//! Angles are measured in the image plane (x, y). Depth from a monocular
//! extractor is too noisy to be useful at the vertex.

use crate::models::{Joint, JointAngleSet, LandmarkSet};

/// Landmarks below this visibility are treated as missing.
pub const DEFAULT_MIN_VISIBILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct KinematicCalculator {
    min_visibility: f64,
}

impl Default for KinematicCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VISIBILITY)
    }
}

impl KinematicCalculator {
    pub fn new(min_visibility: f64) -> Self {
        Self { min_visibility }
    }

    /// Compute every joint whose three landmarks are present and non-degenerate.
    pub fn joint_angles(&self, landmarks: &LandmarkSet) -> JointAngleSet {
        Joint::ALL
            .iter()
            .filter_map(|joint| self.joint_angle(landmarks, *joint).map(|a| (*joint, a)))
            .collect()
    }

    pub fn joint_angle(&self, landmarks: &LandmarkSet, joint: Joint) -> Option<f64> {
        let (proximal, vertex, distal) = joint.landmark_indices();
        angle_at(
            self.point(landmarks, proximal)?,
            self.point(landmarks, vertex)?,
            self.point(landmarks, distal)?,
        )
    }

    fn point(&self, landmarks: &LandmarkSet, index: usize) -> Option<(f64, f64)> {
        landmarks
            .get(index)
            .filter(|p| p.visibility >= self.min_visibility)
            .map(|p| (p.x, p.y))
    }
}

/// Angle at `vertex` in degrees, in `[0, 180]`.
///
/// Returns `None` when either arm has zero length.
pub fn angle_at(proximal: (f64, f64), vertex: (f64, f64), distal: (f64, f64)) -> Option<f64> {
    let v1 = (proximal.0 - vertex.0, proximal.1 - vertex.1);
    let v2 = (distal.0 - vertex.0, distal.1 - vertex.1);

    let norm = v1.0.hypot(v1.1) * v2.0.hypot(v2.1);
    if norm <= f64::EPSILON * f64::EPSILON || !norm.is_finite() {
        return None;
    }

    let cosine = (v1.0 * v2.0 + v1.1 * v2.1) / norm;
    Some(cosine.clamp(-1.0, 1.0).acos().to_degrees())
}
