//! Ordered decision list over joint angles.
//!
//! The first rule whose bounds all hold wins. Overlapping rules are resolved
//! by position in [`RULES`], never by closeness of fit.

use crate::models::{Joint, JointAngleSet, GENERAL_POSE, UNKNOWN_POSE};

/// Assumed angle for a joint missing from a non-empty angle set.
const STRAIGHT: f64 = 180.0;

/// `|angle - expected| < tolerance` for one joint.
#[derive(Debug, Clone, Copy)]
struct Bound {
    joint: Joint,
    expected: f64,
    tolerance: f64,
}

const fn bound(joint: Joint, expected: f64, tolerance: f64) -> Bound {
    Bound {
        joint,
        expected,
        tolerance,
    }
}

#[derive(Debug)]
struct Rule {
    pose: &'static str,
    bounds: &'static [Bound],
}

const RULES: &[Rule] = &[
    Rule {
        pose: "warrior_1",
        bounds: &[
            bound(Joint::LeftKnee, 90.0, 20.0),
            bound(Joint::RightKnee, 180.0, 20.0),
        ],
    },
    Rule {
        pose: "tree",
        bounds: &[
            bound(Joint::LeftKnee, 90.0, 30.0),
            bound(Joint::RightKnee, 180.0, 20.0),
        ],
    },
    Rule {
        pose: "mountain",
        bounds: &[
            bound(Joint::LeftElbow, 180.0, 20.0),
            bound(Joint::RightElbow, 180.0, 20.0),
            bound(Joint::LeftKnee, 180.0, 20.0),
            bound(Joint::RightKnee, 180.0, 20.0),
        ],
    },
];

impl Rule {
    fn matches(&self, angles: &JointAngleSet) -> bool {
        self.bounds.iter().all(|b| {
            let angle = angles.get(&b.joint).copied().unwrap_or(STRAIGHT);
            (angle - b.expected).abs() < b.tolerance
        })
    }
}

/// Pick the pose name for a set of joint angles.
///
/// Returns [`UNKNOWN_POSE`] for an empty set and [`GENERAL_POSE`] when no
/// rule matches.
pub fn classify(angles: &JointAngleSet) -> &'static str {
    if angles.is_empty() {
        return UNKNOWN_POSE;
    }

    RULES
        .iter()
        .find(|rule| rule.matches(angles))
        .map(|rule| rule.pose)
        .unwrap_or(GENERAL_POSE)
}
