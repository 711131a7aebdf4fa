use super::catalog::PoseReference;
use crate::models::JointAngleSet;

/// Joints further than this from their target get a correction.
pub const CORRECTION_THRESHOLD_DEG: f64 = 15.0;

/// Score reported when nothing can be compared.
pub const NEUTRAL_SCORE: f64 = 50.0;

pub const AFFIRMATION: &str = "Great form! Keep holding the pose.";

/// Quality score and corrections for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub quality_score: f64,
    pub corrections: Vec<String>,
}

/// Compare measured angles against the matched reference, if any.
pub fn assess(angles: &JointAngleSet, reference: Option<&PoseReference>) -> Assessment {
    Assessment {
        quality_score: quality_score(angles, reference),
        corrections: corrections(angles, reference),
    }
}

/// Directional instructions in joint enumeration order, or a single
/// affirmation when every compared joint is within threshold.
pub fn corrections(angles: &JointAngleSet, reference: Option<&PoseReference>) -> Vec<String> {
    let mut out: Vec<String> = match reference {
        Some(reference) => angles
            .iter()
            .filter_map(|(joint, current)| {
                let target = reference.target(*joint)?;
                let difference = (current - target).abs();
                if difference <= CORRECTION_THRESHOLD_DEG {
                    return None;
                }
                let direction = if *current > target {
                    "Decrease"
                } else {
                    "Increase"
                };
                Some(format!(
                    "{direction} {} angle by {difference:.1} degrees",
                    joint.label()
                ))
            })
            .collect(),
        None => Vec::new(),
    };

    if out.is_empty() {
        out.push(AFFIRMATION.to_string());
    }
    out
}

/// `max(0, 100 - 100 * mean(|current - target| / 180))`, one decimal.
pub fn quality_score(angles: &JointAngleSet, reference: Option<&PoseReference>) -> f64 {
    let Some(reference) = reference else {
        return NEUTRAL_SCORE;
    };

    let errors: Vec<f64> = angles
        .iter()
        .filter_map(|(joint, current)| {
            reference
                .target(*joint)
                .map(|target| (current - target).abs() / 180.0)
        })
        .collect();

    if errors.is_empty() {
        return NEUTRAL_SCORE;
    }

    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    let score = (100.0 - mean * 100.0).max(0.0);
    (score * 10.0).round() / 10.0
}
