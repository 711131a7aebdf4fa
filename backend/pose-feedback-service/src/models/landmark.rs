use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Points produced per frame by the 33-point body landmark model.
pub const LANDMARK_COUNT: usize = 33;

/// One tracked body location in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(id: u32, x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self {
            id,
            x,
            y,
            z,
            visibility,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.visibility.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("landmark at position {index} carries id {id}")]
    IdMismatch { index: usize, id: u32 },
}

/// Positionally indexed landmarks for a single frame.
///
/// Index `n` always refers to the same body joint; the indexing is fixed by
/// the extractor and is not configurable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet(Vec<Landmark>);

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self(points)
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.0.iter()
    }

    /// Reject sets that would poison angle math downstream.
    pub fn validate(&self) -> Result<(), LandmarkError> {
        for (index, point) in self.0.iter().enumerate() {
            if !point.is_finite() {
                return Err(LandmarkError::NonFinite { index });
            }
            if point.id as usize != index {
                return Err(LandmarkError::IdMismatch {
                    index,
                    id: point.id,
                });
            }
        }
        Ok(())
    }
}
