use crate::models::Joint;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

static STANDARD_CATALOG: Lazy<Arc<PoseCatalog>> = Lazy::new(|| Arc::new(PoseCatalog::standard()));

/// Named target pose with expected per-joint angles in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseReference {
    name: &'static str,
    targets: BTreeMap<Joint, f64>,
}

impl PoseReference {
    fn new(name: &'static str, targets: &[(Joint, f64)]) -> Self {
        Self {
            name,
            targets: targets.iter().copied().collect(),
        }
    }

    pub fn target(&self, joint: Joint) -> Option<f64> {
        self.targets.get(&joint).copied()
    }

    pub fn targets(&self) -> impl Iterator<Item = (Joint, f64)> + '_ {
        self.targets.iter().map(|(j, a)| (*j, *a))
    }
}

/// Immutable reference pose table.
///
/// Built once and shared read-only between every session; there is no API
/// to modify it after construction.
#[derive(Debug)]
pub struct PoseCatalog {
    poses: HashMap<&'static str, PoseReference>,
}

impl PoseCatalog {
    /// The built-in yoga pose table.
    pub fn standard() -> Self {
        use Joint::*;

        let straight = [
            (LeftElbow, 180.0),
            (RightElbow, 180.0),
            (LeftKnee, 180.0),
            (RightKnee, 180.0),
        ];
        let lunge = [
            (LeftKnee, 90.0),
            (RightKnee, 180.0),
            (LeftElbow, 180.0),
            (RightElbow, 180.0),
        ];

        Self::from_references(vec![
            PoseReference::new("mountain", &straight),
            PoseReference::new("warrior_1", &lunge),
            PoseReference::new("downward_dog", &straight),
            PoseReference::new("tree", &lunge),
            PoseReference::new("plank", &straight),
        ])
    }

    /// Process-wide shared instance of [`PoseCatalog::standard`].
    pub fn shared() -> Arc<PoseCatalog> {
        STANDARD_CATALOG.clone()
    }

    pub fn from_references(references: Vec<PoseReference>) -> Self {
        Self {
            poses: references.into_iter().map(|r| (r.name, r)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PoseReference> {
        self.poses.get(name)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}
