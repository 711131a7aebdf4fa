//! Landmark extraction boundary.
//!
//! The pose-estimation model runs outside this process. Sessions reach it
//! through [`ExtractionGate`], which bounds concurrent calls and fails fast
//! when the extractor is down.

pub mod http;

use crate::models::LandmarkSet;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

pub use http::HttpLandmarkExtractor;

#[derive(Debug, Clone, Error)]
pub enum ExtractorError {
    #[error("invalid image data: {0}")]
    Decode(String),

    #[error("landmark extractor unavailable: {0}")]
    Unavailable(String),

    #[error("landmark extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("landmark extractor error: {0}")]
    Upstream(String),
}

/// External pose-estimation model.
///
/// `Ok(None)` means the image was decoded but no person was found.
#[async_trait]
pub trait LandmarkExtractor: Send + Sync {
    async fn extract(&self, image: &[u8]) -> Result<Option<LandmarkSet>, ExtractorError>;

    fn is_ready(&self) -> bool;
}

/// Stand-in used when no extractor endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableExtractor;

#[async_trait]
impl LandmarkExtractor for UnavailableExtractor {
    async fn extract(&self, _image: &[u8]) -> Result<Option<LandmarkSet>, ExtractorError> {
        Err(ExtractorError::Unavailable(
            "no landmark extractor configured".to_string(),
        ))
    }

    fn is_ready(&self) -> bool {
        false
    }
}

/// Decode a base64 image, accepting the `data:<mime>;base64,` prefix browsers
/// put on canvas captures.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>, ExtractorError> {
    let encoded = match payload.split_once(',') {
        Some((header, body)) if header.starts_with("data:") => body,
        _ => payload,
    };
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(ExtractorError::Decode("empty image payload".to_string()));
    }

    STANDARD
        .decode(encoded)
        .map_err(|e| ExtractorError::Decode(e.to_string()))
}

/// Admission control in front of the shared extractor.
///
/// At most `max_in_flight` calls run at once across every session; each call
/// (including the wait for a permit) is bounded by `timeout`.
#[derive(Clone)]
pub struct ExtractionGate {
    extractor: Arc<dyn LandmarkExtractor>,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    timeout: Duration,
}

impl ExtractionGate {
    pub fn new(extractor: Arc<dyn LandmarkExtractor>, max_in_flight: usize, timeout: Duration) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            extractor,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            timeout,
        }
    }

    /// Gate that rejects every call; for deployments doing client-side extraction.
    pub fn unavailable() -> Self {
        Self::new(Arc::new(UnavailableExtractor), 1, Duration::from_secs(1))
    }

    pub fn is_ready(&self) -> bool {
        self.extractor.is_ready()
    }

    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub async fn extract(&self, image: &[u8]) -> Result<Option<LandmarkSet>, ExtractorError> {
        if !self.extractor.is_ready() {
            return Err(ExtractorError::Unavailable(
                "landmark extractor is not ready".to_string(),
            ));
        }

        let call = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| ExtractorError::Unavailable("extraction gate closed".to_string()))?;
            self.extractor.extract(image).await
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ExtractorError::Timeout(self.timeout))?
    }
}
