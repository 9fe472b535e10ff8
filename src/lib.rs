//! # copd-risk
//!
//! COPD risk estimation from resting breathing-pattern features.
//!
//! Ten patient features are projected into the order recorded by the
//! training export, normalized with the fitted standard scaler, scored by the
//! fitted logistic regression, and thresholded into a HIGH_RISK / LOW_RISK
//! verdict.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (feature catalogue, vectors, scores, verdicts)
//! - `ports`: Trait definitions for the scaler, classifier and artifact store
//! - `adapters`: Concrete implementations (JSON artifacts, signed manifest, log sanitizer)
//! - `application`: The pipeline stages and the shared prediction service
//! - `session`: Line-delimited JSON request boundary used by the host binary

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod session;

pub use adapters::ArtifactLoadError;
pub use application::PredictionService;
pub use domain::{PredictionError, PredictionReport, RiskLevel, RiskVerdict};

/// Result type for copd-risk operations
pub type Result<T> = std::result::Result<T, RiskError>;

/// Main error type for copd-risk
#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    #[error("Artifact load failed: {0}")]
    ArtifactLoad(#[from] ArtifactLoadError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictionError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RiskError {
    /// Whether this error must stop the service rather than fail one request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Prediction(_))
    }
}
