//! Standard scaler: Implementation of `Scaler` from exported fit parameters.
//!
//! Field names mirror the fitted attributes written by the training export
//! (`mean_`, `scale_`, `n_features_in_`, `feature_names_in_`).

use serde::{Deserialize, Serialize};

use crate::domain::PredictionError;
use crate::ports::Scaler;

/// Fitted standard scaler: `z = (x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(rename = "mean_")]
    mean: Vec<f64>,

    #[serde(rename = "scale_")]
    scale: Vec<f64>,

    #[serde(rename = "n_features_in_", default, skip_serializing_if = "Option::is_none")]
    n_features_in: Option<usize>,

    #[serde(rename = "feature_names_in_", default, skip_serializing_if = "Option::is_none")]
    feature_names_in: Option<Vec<String>>,
}

impl StandardScaler {
    /// Create a scaler from fitted parameters.
    ///
    /// # Errors
    /// Returns error if the parameters fail `validate`.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        let scaler = Self {
            mean,
            scale,
            n_features_in: None,
            feature_names_in: None,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check parameter shapes and values.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.mean.len();
        if n == 0 {
            return Err("mean_ is empty".into());
        }
        if self.scale.len() != n {
            return Err(format!(
                "scale_ has {} entries, mean_ has {n}",
                self.scale.len()
            ));
        }
        if let Some(declared) = self.n_features_in {
            if declared != n {
                return Err(format!("n_features_in_ is {declared}, mean_ has {n}"));
            }
        }
        if let Some(names) = &self.feature_names_in {
            if names.len() != n {
                return Err(format!(
                    "feature_names_in_ has {} entries, mean_ has {n}",
                    names.len()
                ));
            }
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("mean_[{i}] is not finite"));
        }
        if let Some(i) = self
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s < 0.0)
        {
            return Err(format!("scale_[{i}] must be finite and non-negative"));
        }
        Ok(())
    }

    /// Feature names the scaler was fitted on, if the export recorded them.
    #[must_use]
    pub fn feature_names_in(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if values.len() != self.mean.len() {
            return Err(PredictionError::ShapeMismatch {
                expected: self.mean.len(),
                actual: values.len(),
            });
        }

        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // A constant feature is fitted with zero variance; it is centered only.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_is_affine_per_feature() {
        let scaler = StandardScaler::new(vec![10.0, 0.5], vec![2.0, 0.5]).expect("valid");
        let z = scaler.transform(&[14.0, 0.0]).expect("should transform");

        assert!((z[0] - 2.0).abs() < 1e-12);
        assert!((z[1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_scale_only_centers() {
        let scaler = StandardScaler::new(vec![3.0], vec![0.0]).expect("valid");
        let z = scaler.transform(&[5.0]).expect("should transform");
        assert!((z[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_rejects_wrong_arity() {
        let scaler = StandardScaler::new(vec![0.0, 0.0], vec![1.0, 1.0]).expect("valid");
        let err = scaler.transform(&[1.0]).expect_err("must fail");
        assert_eq!(
            err,
            PredictionError::ShapeMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_validation() {
        assert!(StandardScaler::new(vec![], vec![]).is_err());
        assert!(StandardScaler::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(StandardScaler::new(vec![f64::NAN], vec![1.0]).is_err());
        assert!(StandardScaler::new(vec![0.0], vec![-1.0]).is_err());

        let declared: StandardScaler = serde_json::from_str(
            r#"{"mean_": [0.0, 1.0], "scale_": [1.0, 1.0], "n_features_in_": 3}"#,
        )
        .expect("parses");
        assert!(declared.validate().is_err());
    }

    #[test]
    fn test_deserialize_exported_attributes() {
        let scaler: StandardScaler = serde_json::from_str(
            r#"{"mean_": [62.0], "scale_": [11.4], "feature_names_in_": ["age"]}"#,
        )
        .expect("parses");

        assert!(scaler.validate().is_ok());
        assert_eq!(scaler.n_features(), 1);
        assert_eq!(scaler.feature_names_in(), Some(&["age".to_string()][..]));
    }
}
