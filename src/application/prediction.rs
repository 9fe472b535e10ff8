//! Prediction service: Runs the full pipeline against shared artifacts.
//!
//! The loaded artifacts are immutable and held behind an `Arc`, so cloning
//! the service is cheap and clones can serve requests from any thread.

use std::str::FromStr;
use std::sync::Arc;

use super::{normalize, predict};
use crate::domain::{
    interpret, validate_ranges, FeatureNames, FeatureVector, PredictionError, PredictionReport,
    RawInputs, RiskVerdict,
};
use crate::ports::{ArtifactStore, Artifacts, Classifier, Scaler};

/// What to do with inputs outside the documented feature ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Do not check ranges
    Ignore,
    /// Log violations by feature name and continue
    #[default]
    Warn,
    /// Fail the request with `PredictionError::OutOfRange`
    Reject,
}

impl FromStr for RangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "warn" => Ok(Self::Warn),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown range policy {other:?} (expected ignore, warn or reject)"
            )),
        }
    }
}

/// Service for running COPD risk predictions.
pub struct PredictionService<S, C> {
    artifacts: Arc<Artifacts<S, C>>,
    range_policy: RangePolicy,
}

impl<S, C> Clone for PredictionService<S, C> {
    fn clone(&self) -> Self {
        Self {
            artifacts: Arc::clone(&self.artifacts),
            range_policy: self.range_policy,
        }
    }
}

impl<S: Scaler, C: Classifier> PredictionService<S, C> {
    /// Create a service over already-loaded artifacts.
    #[must_use]
    pub fn new(artifacts: Artifacts<S, C>) -> Self {
        Self {
            artifacts: Arc::new(artifacts),
            range_policy: RangePolicy::default(),
        }
    }

    /// Load artifacts from `store` and create the service.
    ///
    /// # Errors
    /// Returns the store's error if loading fails. No service is created.
    pub fn from_store<A>(store: &A) -> Result<Self, A::Error>
    where
        A: ArtifactStore<Scaler = S, Classifier = C>,
    {
        let artifacts = store.load().map_err(|e| {
            tracing::error!("Artifact loading failed: {e}");
            e
        })?;
        Ok(Self::new(artifacts))
    }

    #[must_use]
    pub fn with_range_policy(mut self, policy: RangePolicy) -> Self {
        self.range_policy = policy;
        self
    }

    #[must_use]
    pub fn range_policy(&self) -> RangePolicy {
        self.range_policy
    }

    /// Feature order the model was fitted on.
    #[must_use]
    pub fn feature_names(&self) -> &FeatureNames {
        self.artifacts.feature_names()
    }

    /// Run the pipeline for one request.
    ///
    /// # Errors
    /// Returns a `PredictionError` for this request only; the service stays usable.
    pub fn predict(&self, raw: &RawInputs) -> Result<RiskVerdict, PredictionError> {
        self.check_ranges(raw)?;

        let features = FeatureVector::build(raw, self.artifacts.feature_names())?;
        tracing::debug!(n_features = features.len(), "Built feature vector");

        let normalized = normalize(&features, self.artifacts.scaler())?;
        tracing::debug!("Normalized feature vector");

        let score = predict(&normalized, self.artifacts.classifier())?;
        let verdict = interpret(score);

        tracing::info!(
            verdict = %verdict.level(),
            probability = score.value(),
            "Prediction complete"
        );
        Ok(verdict)
    }

    /// Run the pipeline and render the result.
    ///
    /// # Errors
    /// Same as `predict`.
    pub fn report(&self, raw: &RawInputs) -> Result<PredictionReport, PredictionError> {
        self.predict(raw).map(|verdict| verdict.report())
    }

    fn check_ranges(&self, raw: &RawInputs) -> Result<(), PredictionError> {
        if self.range_policy == RangePolicy::Ignore {
            return Ok(());
        }

        let violations = validate_ranges(raw);
        if violations.is_empty() {
            return Ok(());
        }

        match self.range_policy {
            RangePolicy::Reject => Err(PredictionError::OutOfRange(violations)),
            _ => {
                for violation in &violations {
                    tracing::warn!("Input outside documented range: {violation}");
                }
                Ok(())
            }
        }
    }
}
