//! Domain layer: Core types and logic of the risk pipeline.
//!
//! This module contains pure Rust types with no I/O. Everything here is
//! created per request and discarded after rendering.

mod error;
mod features;
mod vector;
mod verdict;

pub use error::PredictionError;
pub use features::{
    feature_spec, validate_ranges, FeatureGroup, FeatureKind, FeatureNames, FeatureSpec,
    RangeViolation, RawInputs, ViolationReason, FEATURE_CATALOGUE,
};
pub use vector::{FeatureVector, NormalizedVector};
pub use verdict::{
    interpret, PredictionReport, RiskLevel, RiskScore, RiskVerdict, CLINICAL_NOTICE, RISK_THRESHOLD,
};
