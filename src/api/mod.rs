//! Backend API surface — request/response types and the HTTP client.

pub mod client;
pub mod types;

pub use client::{Analyzer, ApiError, BackendClient};
pub use types::{
    AnalysisReport, AnalysisResponse, AudioSource, BackendHealth, Gender, PatientInfo, Prediction,
    TopFeature, ValidationError,
};
