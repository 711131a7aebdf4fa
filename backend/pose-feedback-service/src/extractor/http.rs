use super::{ExtractorError, LandmarkExtractor};
use crate::models::LandmarkSet;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    landmarks: Option<LandmarkSet>,
}

/// Client for a pose-estimation sidecar.
///
/// Posts the raw image bytes and expects `{"landmarks": [...] | null}`.
/// 400/422 means the sidecar could not decode the image.
pub struct HttpLandmarkExtractor {
    client: reqwest::Client,
    url: String,
}

impl HttpLandmarkExtractor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ExtractorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ExtractorError::Unavailable(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl LandmarkExtractor for HttpLandmarkExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Option<LandmarkSet>, ExtractorError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ExtractorError::Unavailable(e.to_string())
                } else {
                    ExtractorError::Upstream(e.to_string())
                }
            })?;

        match response.status() {
            status if status.is_success() => {
                let body: ExtractResponse = response
                    .json()
                    .await
                    .map_err(|e| ExtractorError::Upstream(format!("invalid response body: {e}")))?;
                Ok(body.landmarks.filter(|set| !set.is_empty()))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let detail = response.text().await.unwrap_or_default();
                Err(ExtractorError::Decode(detail))
            }
            StatusCode::SERVICE_UNAVAILABLE => Err(ExtractorError::Unavailable(
                "extractor reported 503".to_string(),
            )),
            status => Err(ExtractorError::Upstream(format!(
                "unexpected status {status}"
            ))),
        }
    }

    fn is_ready(&self) -> bool {
        true
    }
}
