//! Artifact store port: Trait for loading the fitted artifacts.
//!
//! Loading happens once at startup. There is no per-request access.

use super::{Classifier, Scaler};
use crate::domain::FeatureNames;

/// The three artifacts the pipeline needs, checked for mutual consistency.
#[derive(Debug, Clone)]
pub struct Artifacts<S, C> {
    feature_names: FeatureNames,
    scaler: S,
    classifier: C,
}

impl<S: Scaler, C: Classifier> Artifacts<S, C> {
    /// Bundle artifacts.
    ///
    /// # Errors
    /// Returns a description of the mismatch if the scaler or classifier arity
    /// differs from the number of feature names.
    pub fn new(feature_names: FeatureNames, scaler: S, classifier: C) -> Result<Self, String> {
        let n = feature_names.len();
        if scaler.n_features() != n {
            return Err(format!(
                "scaler expects {} features but feature_names lists {n}",
                scaler.n_features()
            ));
        }
        if classifier.n_features() != n {
            return Err(format!(
                "classifier expects {} features but feature_names lists {n}",
                classifier.n_features()
            ));
        }
        Ok(Self {
            feature_names,
            scaler,
            classifier,
        })
    }

    #[must_use]
    pub fn feature_names(&self) -> &FeatureNames {
        &self.feature_names
    }

    #[must_use]
    pub fn scaler(&self) -> &S {
        &self.scaler
    }

    #[must_use]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}

/// Trait for artifact sources.
///
/// A failed load is fatal: callers must not serve predictions without a
/// complete, consistent set.
pub trait ArtifactStore {
    type Scaler: Scaler;
    type Classifier: Classifier;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load feature order, scaler and classifier.
    ///
    /// # Errors
    /// Returns `Self::Error` if any artifact is missing, unreadable or invalid.
    fn load(&self) -> Result<Artifacts<Self::Scaler, Self::Classifier>, Self::Error>;
}
