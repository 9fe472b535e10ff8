//! Model-ordered feature vectors.

use super::{FeatureNames, PredictionError, RawInputs};

/// Raw feature values in model order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Project named inputs into the sequence given by `order`.
    ///
    /// Keys that `order` does not name are ignored.
    ///
    /// # Errors
    /// Returns `PredictionError::MissingFeature` naming the first key of
    /// `order` that `raw` does not contain.
    pub fn build(raw: &RawInputs, order: &FeatureNames) -> Result<Self, PredictionError> {
        let values = order
            .iter()
            .map(|name| {
                raw.get(name)
                    .ok_or_else(|| PredictionError::MissingFeature(name.to_string()))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        if raw.len() > order.len() {
            let mut ignored: Vec<&str> = raw.keys().filter(|k| !order.contains(k)).collect();
            ignored.sort_unstable();
            tracing::warn!(?ignored, "Ignoring inputs not used by the model");
        }

        Ok(Self { values })
    }

    /// Wrap values that are already in model order.
    #[must_use]
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Feature values in model-input space. All values are finite.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedVector {
    values: Vec<f64>,
}

impl NormalizedVector {
    /// # Errors
    /// Returns `PredictionError::Inference` if any value is NaN or infinite.
    pub fn new(values: Vec<f64>) -> Result<Self, PredictionError> {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(PredictionError::Inference(format!(
                "normalized value at position {i} is not finite"
            )));
        }
        Ok(Self { values })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_order() -> FeatureNames {
        FeatureNames::new(
            [
                "smoke",
                "age",
                "r2",
                "tt1",
                "gender",
                "nl21",
                "nl12",
                "r1",
                "omega_mean21",
                "f2",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .expect("valid order")
    }

    fn scenario_pairs() -> Vec<(&'static str, f64)> {
        vec![
            ("age", 59.0),
            ("gender", 1.0),
            ("smoke", 0.0),
            ("r1", 60.0),
            ("tt1", 10.81),
            ("nl12", 5.01),
            ("f2", 20.19),
            ("r2", 60.92),
            ("nl21", 6.60),
            ("omega_mean21", 31.47),
        ]
    }

    #[test]
    fn test_build_follows_injected_order() {
        let raw: RawInputs = scenario_pairs().into_iter().collect();
        let vec = FeatureVector::build(&raw, &model_order()).expect("should build");

        assert_eq!(
            vec.as_slice(),
            &[0.0, 59.0, 60.92, 10.81, 1.0, 6.60, 5.01, 60.0, 31.47, 20.19]
        );
    }

    #[test]
    fn test_build_is_independent_of_input_order() {
        let order = model_order();
        let forward: RawInputs = scenario_pairs().into_iter().collect();
        let reversed: RawInputs = scenario_pairs().into_iter().rev().collect();
        let rotated: RawInputs = {
            let mut pairs = scenario_pairs();
            pairs.rotate_left(4);
            pairs.into_iter().collect()
        };

        let expected = FeatureVector::build(&forward, &order).expect("should build");
        assert_eq!(FeatureVector::build(&reversed, &order).expect("should build"), expected);
        assert_eq!(FeatureVector::build(&rotated, &order).expect("should build"), expected);
    }

    #[test]
    fn test_build_names_each_missing_feature() {
        let order = model_order();
        for (name, _) in scenario_pairs() {
            let mut raw: RawInputs = scenario_pairs().into_iter().collect();
            raw.remove(name);

            let err = FeatureVector::build(&raw, &order).expect_err("must fail");
            assert_eq!(err, PredictionError::MissingFeature(name.to_string()));
        }
    }

    #[test]
    fn test_build_ignores_unknown_keys() {
        let mut raw: RawInputs = scenario_pairs().into_iter().collect();
        raw.insert("height", 172.0);

        let vec = FeatureVector::build(&raw, &model_order()).expect("should build");
        assert_eq!(vec.len(), 10);
    }

    #[test]
    fn test_normalized_vector_rejects_non_finite() {
        assert!(NormalizedVector::new(vec![0.1, -1.2]).is_ok());

        let err = NormalizedVector::new(vec![0.1, f64::INFINITY]).expect_err("must fail");
        assert!(matches!(err, PredictionError::Inference(_)));
    }
}
