//! Per-frame transform: landmarks -> angles -> pose -> feedback.
//!
//! Stage failures are converted into [`FrameOutcome::ProcessingError`] here
//! and never reach the session loop.

use crate::extractor::{decode_image_payload, ExtractionGate, ExtractorError};
use crate::kinematics::KinematicCalculator;
use crate::models::{FeedbackResult, FrameOutcome, LandmarkError, LandmarkSet};
use crate::pose::{self, PoseCatalog};
use chrono::Utc;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use thiserror::Error;

pub const NO_POSE_MESSAGE: &str = "No pose detected. Please ensure you're visible in the camera.";

/// Body of an inbound `pose_frame` message.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FramePayload {
    /// Bare base64 or data-URL string.
    Encoded(String),
    /// `{"image": "<base64>"}`, landmarks extracted server-side.
    Image { image: String },
    /// `{"landmarks": [...] | null}`, landmarks extracted client-side. The
    /// key is required; `null` means the client saw nobody.
    Landmarks {
        #[serde(deserialize_with = "nullable_landmarks")]
        landmarks: Option<LandmarkSet>,
    },
    /// Anything else. Reported as a processing error, never as "no pose".
    Unrecognized(serde_json::Value),
}

fn nullable_landmarks<'de, D>(deserializer: D) -> Result<Option<LandmarkSet>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer)
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed landmark set: {0}")]
    Malformed(#[from] LandmarkError),

    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    #[error("unrecognized frame payload: expected an image or a landmarks field")]
    UnrecognizedPayload,
}

pub struct FramePipeline {
    calculator: KinematicCalculator,
    catalog: Arc<PoseCatalog>,
    extraction: ExtractionGate,
}

impl FramePipeline {
    pub fn new(catalog: Arc<PoseCatalog>, calculator: KinematicCalculator, extraction: ExtractionGate) -> Self {
        Self {
            calculator,
            catalog,
            extraction,
        }
    }

    pub fn extraction(&self) -> &ExtractionGate {
        &self.extraction
    }

    /// Process already-extracted landmarks. `None` means the extractor found
    /// no person in the frame.
    pub fn process(&self, landmarks: Option<&LandmarkSet>) -> FrameOutcome {
        let Some(landmarks) = landmarks else {
            return no_pose();
        };

        match self.analyze(landmarks) {
            Ok(result) => FrameOutcome::Feedback(result),
            Err(e) => processing_error(e),
        }
    }

    /// Process an inbound payload, calling the extractor for image frames.
    pub async fn process_payload(&self, payload: FramePayload) -> FrameOutcome {
        match payload {
            FramePayload::Landmarks { landmarks } => self.process(landmarks.as_ref()),
            FramePayload::Encoded(image) | FramePayload::Image { image } => {
                match self.extract(&image).await {
                    Ok(landmarks) => self.process(landmarks.as_ref()),
                    Err(e) => processing_error(e),
                }
            }
            FramePayload::Unrecognized(_) => processing_error(PipelineError::UnrecognizedPayload),
        }
    }

    async fn extract(&self, image: &str) -> Result<Option<LandmarkSet>, PipelineError> {
        let bytes = decode_image_payload(image)?;
        Ok(self.extraction.extract(&bytes).await?)
    }

    fn analyze(&self, landmarks: &LandmarkSet) -> Result<FeedbackResult, PipelineError> {
        landmarks.validate()?;

        let joint_angles = self.calculator.joint_angles(landmarks);
        let detected_pose = pose::classify(&joint_angles);
        let assessment = pose::assess(&joint_angles, self.catalog.get(detected_pose));

        Ok(FeedbackResult {
            detected_pose: detected_pose.to_string(),
            quality_score: assessment.quality_score,
            corrections: assessment.corrections,
            joint_angles,
            timestamp: Utc::now(),
        })
    }
}

fn no_pose() -> FrameOutcome {
    FrameOutcome::NoPoseDetected {
        message: NO_POSE_MESSAGE.to_string(),
    }
}

fn processing_error(e: impl Into<PipelineError>) -> FrameOutcome {
    let e = e.into();
    tracing::warn!(error = %e, "Frame processing error");
    FrameOutcome::ProcessingError {
        message: format!("Processing failed: {e}"),
    }
}
