//! `Analyzer` trait and the HTTP client for the classification backend.
//!
//! The backend exposes three endpoints: `POST /analyze` (multipart audio +
//! patient fields), `GET /download/{filename}` (the generated PDF report)
//! and `GET /health`.  All connection details come from [`BackendConfig`];
//! nothing is hardcoded.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use crate::api::types::{
    AnalysisReport, AnalysisResponse, AudioSource, BackendHealth, PatientInfo, Prediction,
};
use crate::config::BackendConfig;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors that can occur talking to the classification backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport or connection error.
    #[error("could not reach the analysis server: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("the analysis request timed out")]
    Timeout,

    /// Non-success HTTP status with no structured `error` body.
    #[error("the analysis server returned HTTP {0}")]
    Http(u16),

    /// The backend reported a failure through its `error` field.
    #[error("{0}")]
    Backend(String),

    /// The response body could not be parsed as expected JSON.
    #[error("failed to parse the server response: {0}")]
    Parse(String),

    /// A success response was missing a required result field.
    #[error("the server response was incomplete: missing {0}")]
    Incomplete(&'static str),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Analyzer trait
// ---------------------------------------------------------------------------

/// Async trait for the backend surface.
///
/// Implementors must be `Send + Sync` so they can be shared with the
/// background network task (e.g. as `Arc<dyn Analyzer>`), and the UI layer
/// can be tested against a mock without a running server.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Submit audio plus patient fields for classification.
    async fn analyze(
        &self,
        audio: AudioSource,
        patient: &PatientInfo,
    ) -> Result<AnalysisReport, ApiError>;

    /// Fetch the generated PDF report by the filename a previous
    /// [`analyze`](Self::analyze) returned.
    async fn download_report(&self, pdf_filename: &str) -> Result<Vec<u8>, ApiError>;

    /// Probe the backend's `/health` endpoint.
    async fn health(&self) -> Result<BackendHealth, ApiError>;
}

// ---------------------------------------------------------------------------
// BackendClient
// ---------------------------------------------------------------------------

/// [`Analyzer`] implementation backed by `reqwest`.
pub struct BackendClient {
    client: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    /// Build a client from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

/// Promote a raw wire response into a validated [`AnalysisReport`].
///
/// A populated `error` field means the whole call failed, regardless of
/// HTTP status.  Otherwise `prediction`, `confidence` and `pdf_filename`
/// are required.
fn into_report(resp: AnalysisResponse) -> Result<AnalysisReport, ApiError> {
    if let Some(message) = resp.error {
        return Err(ApiError::Backend(message));
    }

    let prediction = match resp.prediction {
        Some(0) => Prediction::Healthy,
        Some(_) => Prediction::DiseaseDetected,
        None => return Err(ApiError::Incomplete("prediction")),
    };
    let confidence = resp.confidence.ok_or(ApiError::Incomplete("confidence"))?;
    let pdf_filename = resp
        .pdf_filename
        .ok_or(ApiError::Incomplete("pdf_filename"))?;

    Ok(AnalysisReport {
        prediction,
        confidence,
        top_features: resp.top_features,
        pdf_filename,
        probability_healthy: resp.probability_healthy,
        probability_parkinsons: resp.probability_parkinsons,
        needs_review: resp.needs_review,
    })
}

#[async_trait]
impl Analyzer for BackendClient {
    async fn analyze(
        &self,
        audio: AudioSource,
        patient: &PatientInfo,
    ) -> Result<AnalysisReport, ApiError> {
        let file_name = audio.file_name().to_string();
        let mime = audio.mime_type();
        let bytes = audio.into_bytes();

        log::info!("submitting {} ({} bytes) for analysis", file_name, bytes.len());

        let file_part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let form = Form::new()
            .part("audio", file_part)
            .text("name", patient.name.trim().to_string())
            .text("age", patient.age.trim().to_string())
            .text("gender", patient.gender.as_str());

        let response = self
            .client
            .post(self.endpoint("analyze"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // The backend reports failures as JSON `{error: …}` with a non-2xx
        // status; prefer that message over a bare status code.
        match serde_json::from_str::<AnalysisResponse>(&body) {
            Ok(resp) => into_report(resp),
            Err(e) if status.is_success() => Err(ApiError::Parse(e.to_string())),
            Err(_) => Err(ApiError::Http(status.as_u16())),
        }
    }

    async fn download_report(&self, pdf_filename: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("download/{pdf_filename}")))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn health(&self) -> Result<BackendHealth, ApiError> {
        let response = self.client.get(self.endpoint("health")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http(status.as_u16()));
        }

        response
            .json::<BackendHealth>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
