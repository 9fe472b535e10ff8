//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: JSON artifact directory (feature order, scaler, classifier)
//! - `standard_scaler`: fitted `(x - mean) / scale` transform
//! - `logistic`: fitted binary logistic regression
//! - `manifest`: Ed25519-signed SHA-256 manifest over the artifact files
//! - `sanitize`: feature-value and PII filtering for logs

pub mod artifacts;
pub mod logistic;
pub mod manifest;
pub mod sanitize;
pub mod standard_scaler;

pub use artifacts::{ArtifactLoadError, JsonArtifactStore};
pub use logistic::LogisticRegression;
pub use standard_scaler::StandardScaler;
