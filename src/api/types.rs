//! Request/response data model for the classification backend.
//!
//! Mirrors the backend's `/analyze` JSON contract: an optional `error`
//! string (present ⇒ the whole call failed), a 0/1 prediction, a
//! confidence in `[0.0, 1.0]`, ranked feature contributions, and the
//! generated report filename.

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// PatientInfo
// ---------------------------------------------------------------------------

/// Gender selection from the patient form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    /// Nothing selected yet — fails validation.
    #[default]
    Unspecified,
    Male,
    Female,
    Other,
}

impl Gender {
    /// Wire value sent in the multipart form.
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Unspecified => "",
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// Patient fields collected by the form and sent alongside the audio.
#[derive(Debug, Clone, Default)]
pub struct PatientInfo {
    pub name: String,
    /// Kept as the raw form string; validated as a number in 1–120.
    pub age: String,
    pub gender: Gender,
}

/// Field-level validation failures, checked client-side before any
/// network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter the patient's name")]
    MissingName,
    #[error("please enter a valid age (1\u{2013}120)")]
    InvalidAge,
    #[error("please select a gender")]
    MissingGender,
}

impl PatientInfo {
    /// Validate all required fields, collecting every failure so the UI
    /// can prompt per field.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::MissingName);
        }
        match self.age.trim().parse::<u32>() {
            Ok(age) if (1..=120).contains(&age) => {}
            _ => errors.push(ValidationError::InvalidAge),
        }
        if self.gender == Gender::Unspecified {
            errors.push(ValidationError::MissingGender);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ---------------------------------------------------------------------------
// AudioSource
// ---------------------------------------------------------------------------

/// Default filename for a freshly recorded container buffer.
pub const RECORDING_FILE_NAME: &str = "recording.wav";

/// The audio submitted for analysis — either the session's recorded
/// container buffer or a user-selected file forwarded verbatim (arbitrary
/// container, not validated client-side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// WAV byte buffer produced by the capture pipeline.
    Recording(Vec<u8>),
    /// An existing audio file chosen by the user.
    File { name: String, bytes: Vec<u8> },
}

impl AudioSource {
    /// Filename used for the multipart `audio` part.
    pub fn file_name(&self) -> &str {
        match self {
            AudioSource::Recording(_) => RECORDING_FILE_NAME,
            AudioSource::File { name, .. } => name,
        }
    }

    /// MIME type for the multipart `audio` part.  Selected files are sent
    /// as a generic stream since their container is unknown.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioSource::Recording(_) => "audio/wav",
            AudioSource::File { .. } => "application/octet-stream",
        }
    }

    /// Consume into the raw bytes for the request body.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            AudioSource::Recording(bytes) => bytes,
            AudioSource::File { bytes, .. } => bytes,
        }
    }
}

// ---------------------------------------------------------------------------
// Response model
// ---------------------------------------------------------------------------

/// One entry of the ranked feature-importance list.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TopFeature {
    pub name: String,
    pub value: f64,
    pub importance: f64,
}

/// Raw `/analyze` response as it appears on the wire.  Everything except
/// `top_features` is optional so a structured `error` body still parses.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResponse {
    pub error: Option<String>,
    pub prediction: Option<u8>,
    pub confidence: Option<f32>,
    #[serde(default)]
    pub top_features: Vec<TopFeature>,
    pub pdf_filename: Option<String>,
    pub probability_healthy: Option<f32>,
    pub probability_parkinsons: Option<f32>,
    #[serde(default)]
    pub needs_review: bool,
}

/// Classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prediction {
    Healthy,
    DiseaseDetected,
}

impl Prediction {
    pub fn label(self) -> &'static str {
        match self {
            Prediction::Healthy => "Healthy voice pattern",
            Prediction::DiseaseDetected => "Indicators detected",
        }
    }
}

/// A validated, fully-populated analysis result handed to the UI.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub prediction: Prediction,
    /// Model confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Ranked feature contributions, highest importance first.
    pub top_features: Vec<TopFeature>,
    /// Filename for the `/download/{pdf_filename}` report path.
    pub pdf_filename: String,
    pub probability_healthy: Option<f32>,
    pub probability_parkinsons: Option<f32>,
    /// Set when the backend flags a low-confidence result.
    pub needs_review: bool,
}

/// `/health` endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendHealth {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Patient validation -------------------------------------------------

    fn valid_patient() -> PatientInfo {
        PatientInfo {
            name: "Jane Doe".into(),
            age: "64".into(),
            gender: Gender::Female,
        }
    }

    #[test]
    fn complete_patient_validates() {
        assert!(valid_patient().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut p = valid_patient();
        p.name = "   ".into();
        assert_eq!(p.validate().unwrap_err(), vec![ValidationError::MissingName]);
    }

    #[test]
    fn non_numeric_age_is_rejected() {
        let mut p = valid_patient();
        p.age = "sixty".into();
        assert_eq!(p.validate().unwrap_err(), vec![ValidationError::InvalidAge]);
    }

    #[test]
    fn out_of_range_age_is_rejected() {
        for age in ["0", "121", "-5"] {
            let mut p = valid_patient();
            p.age = age.into();
            assert_eq!(
                p.validate().unwrap_err(),
                vec![ValidationError::InvalidAge],
                "age {age} accepted"
            );
        }
    }

    #[test]
    fn unspecified_gender_is_rejected() {
        let mut p = valid_patient();
        p.gender = Gender::Unspecified;
        assert_eq!(
            p.validate().unwrap_err(),
            vec![ValidationError::MissingGender]
        );
    }

    #[test]
    fn empty_form_reports_every_field() {
        let errors = PatientInfo::default().validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn age_with_surrounding_whitespace_parses() {
        let mut p = valid_patient();
        p.age = " 64 ".into();
        assert!(p.validate().is_ok());
    }

    // ---- AudioSource --------------------------------------------------------

    #[test]
    fn recording_uses_default_name_and_wav_mime() {
        let src = AudioSource::Recording(vec![1, 2]);
        assert_eq!(src.file_name(), "recording.wav");
        assert_eq!(src.mime_type(), "audio/wav");
        assert_eq!(src.into_bytes(), vec![1, 2]);
    }

    #[test]
    fn file_keeps_original_name() {
        let src = AudioSource::File {
            name: "voice-sample.flac".into(),
            bytes: vec![7],
        };
        assert_eq!(src.file_name(), "voice-sample.flac");
        assert_eq!(src.mime_type(), "application/octet-stream");
    }

    // ---- Response parsing ---------------------------------------------------

    #[test]
    fn success_response_parses() {
        let json = r#"{
            "success": true,
            "prediction": 1,
            "confidence": 0.87,
            "probability_healthy": 0.13,
            "probability_parkinsons": 0.87,
            "top_features": [
                {"name": "jitter", "value": 0.012, "importance": 0.31},
                {"name": "shimmer", "value": 0.044, "importance": 0.22}
            ],
            "pdf_filename": "report_20260823.pdf",
            "needs_review": false
        }"#;

        let resp: AnalysisResponse = serde_json::from_str(json).unwrap();
        assert!(resp.error.is_none());
        assert_eq!(resp.prediction, Some(1));
        assert_eq!(resp.top_features.len(), 2);
        assert_eq!(resp.top_features[0].name, "jitter");
        assert_eq!(resp.pdf_filename.as_deref(), Some("report_20260823.pdf"));
    }

    #[test]
    fn error_response_parses_without_result_fields() {
        let json = r#"{"error": "No audio file provided"}"#;
        let resp: AnalysisResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.error.as_deref(), Some("No audio file provided"));
        assert!(resp.prediction.is_none());
        assert!(resp.top_features.is_empty());
    }

    #[test]
    fn health_response_parses() {
        let json = r#"{"status": "healthy", "model_loaded": true, "timestamp": "t"}"#;
        let health: BackendHealth = serde_json::from_str(json).unwrap();
        assert_eq!(health.status, "healthy");
        assert!(health.model_loaded);
    }
}
