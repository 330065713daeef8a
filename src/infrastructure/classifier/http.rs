//! HTTP cry classifier adapter

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::{ClassifyError, CryClassifier};
use crate::domain::analysis::ClassificationResult;
use crate::domain::recording::{ArtifactHandle, AudioArtifact, Duration};

/// Endpoint path of the prediction route
pub const PREDICT_PATH: &str = "/predict-type";

/// Multipart field the service reads the recording from
const AUDIO_FIELD: &str = "audio";

/// Longest error body quoted back in an error message
const MAX_ERROR_BODY: usize = 200;

// Response type for the prediction route

#[derive(Debug, Deserialize)]
struct PredictResponse {
    cry_type: String,
    confidence: f64,
    timestamp: String,
}

/// Classifier reached over HTTP with a multipart upload
pub struct HttpCryClassifier {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpCryClassifier {
    /// Create a classifier for the service at `base_url`.
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout.as_std())
            .build()?;

        Ok(Self {
            endpoint: Self::endpoint_for(base_url),
            timeout,
            client,
        })
    }

    /// Build the prediction URL
    fn endpoint_for(base_url: &str) -> String {
        format!("{}{}", base_url.trim().trim_end_matches('/'), PREDICT_PATH)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClassifyError {
        if e.is_timeout() {
            ClassifyError::Unreachable(format!("no answer within {}", self.timeout))
        } else if e.is_connect() {
            ClassifyError::Unreachable(format!("could not connect to {}", self.endpoint))
        } else {
            ClassifyError::Unreachable(e.to_string())
        }
    }

    /// Parse a successful response body
    fn parse_body(body: &str) -> Result<ClassificationResult, ClassifyError> {
        let response: PredictResponse = serde_json::from_str(body)
            .map_err(|e| ClassifyError::BadResponse(format!("unexpected body: {}", e)))?;

        let confidence = response.confidence;
        ClassificationResult::new(response.cry_type, confidence, response.timestamp).ok_or_else(
            || ClassifyError::BadResponse(format!("confidence {} is outside [0, 1]", confidence)),
        )
    }

    /// Load the encoded audio to upload
    async fn read_audio(artifact: &AudioArtifact) -> Result<Vec<u8>, ClassifyError> {
        match artifact.handle() {
            ArtifactHandle::Memory(bytes) => Ok(bytes.clone()),
            ArtifactHandle::File(path) => tokio::fs::read(path).await.map_err(|e| {
                ClassifyError::BadResponse(format!(
                    "recording {} could not be read: {}",
                    path.display(),
                    e
                ))
            }),
        }
    }

    fn truncate(body: &str) -> &str {
        match body.char_indices().nth(MAX_ERROR_BODY) {
            Some((idx, _)) => &body[..idx],
            None => body,
        }
    }
}

#[async_trait]
impl CryClassifier for HttpCryClassifier {
    async fn classify(
        &self,
        artifact: &AudioArtifact,
    ) -> Result<ClassificationResult, ClassifyError> {
        let encoding = artifact.encoding();
        let bytes = Self::read_audio(artifact).await?;

        let part = Part::bytes(bytes)
            .file_name(encoding.upload_file_name())
            .mime_str(encoding.container.mime_type())
            .map_err(|e| ClassifyError::BadResponse(e.to_string()))?;
        let form = Form::new().part(AUDIO_FIELD, part);

        debug!(endpoint = %self.endpoint, %encoding, "uploading recording");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(ClassifyError::BadResponse(format!(
                "HTTP {}: {}",
                status,
                Self::truncate(body.trim())
            )));
        }

        Self::parse_body(&body)
    }
}
