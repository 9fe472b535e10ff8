//! Patient feature types for COPD risk prediction.
//!
//! Ten features: three demographic fields plus breathing-pattern measurements
//! taken while seated (`r1`, `tt1`, `nl12`) and while standing (`f2`, `r2`,
//! `nl21`, `omega_mean21`).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How a feature value is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Whole number within the range
    Integer,
    /// 0 or 1
    Binary,
    /// Real value within the range
    Continuous,
}

/// Which part of the intake a feature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    /// Basic patient information
    Basic,
    /// Resting seated breathing features
    Seated,
    /// Resting standing breathing features
    Standing,
}

/// Static description of one input feature.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FeatureKind,
    pub group: FeatureGroup,
    /// Inclusive lower bound of the documented range
    pub min: f64,
    /// Inclusive upper bound of the documented range
    pub max: f64,
    /// Intake form default
    pub default: f64,
    /// Display precision
    pub decimals: u8,
}

impl FeatureSpec {
    /// Check a value against this feature's documented range and kind.
    #[must_use]
    pub fn check(&self, value: f64) -> Option<RangeViolation> {
        let reason = if !value.is_finite() {
            ViolationReason::NotFinite
        } else if self.kind == FeatureKind::Binary && value != 0.0 && value != 1.0 {
            ViolationReason::NotBinary
        } else if !(self.min..=self.max).contains(&value) {
            ViolationReason::OutsideRange
        } else if self.kind == FeatureKind::Integer && value.fract() != 0.0 {
            ViolationReason::NotInteger
        } else {
            return None;
        };

        Some(RangeViolation {
            feature: self.name,
            value,
            min: self.min,
            max: self.max,
            reason,
        })
    }
}

/// The ten features, in intake order (not model order).
pub const FEATURE_CATALOGUE: [FeatureSpec; 10] = [
    FeatureSpec {
        name: "age",
        label: "Age (years)",
        kind: FeatureKind::Integer,
        group: FeatureGroup::Basic,
        min: 18.0,
        max: 89.0,
        default: 59.0,
        decimals: 0,
    },
    FeatureSpec {
        name: "gender",
        label: "Gender (0 = female, 1 = male)",
        kind: FeatureKind::Binary,
        group: FeatureGroup::Basic,
        min: 0.0,
        max: 1.0,
        default: 0.0,
        decimals: 0,
    },
    FeatureSpec {
        name: "smoke",
        label: "Smoking history (0 = no, 1 = yes)",
        kind: FeatureKind::Binary,
        group: FeatureGroup::Basic,
        min: 0.0,
        max: 1.0,
        default: 0.0,
        decimals: 0,
    },
    FeatureSpec {
        name: "r1",
        label: "Seated inspiratory/expiratory ratio",
        kind: FeatureKind::Continuous,
        group: FeatureGroup::Seated,
        min: 37.27,
        max: 82.54,
        default: 60.0,
        decimals: 2,
    },
    FeatureSpec {
        name: "tt1",
        label: "Seated mean peak expiratory flow time ratio",
        kind: FeatureKind::Continuous,
        group: FeatureGroup::Seated,
        min: 3.77,
        max: 23.87,
        default: 10.81,
        decimals: 2,
    },
    FeatureSpec {
        name: "nl12",
        label: "Seated second-mode nonlinearity index",
        kind: FeatureKind::Continuous,
        group: FeatureGroup::Seated,
        min: 1.74,
        max: 21.02,
        default: 5.01,
        decimals: 2,
    },
    FeatureSpec {
        name: "f2",
        label: "Standing mean respiratory rate",
        kind: FeatureKind::Continuous,
        group: FeatureGroup::Standing,
        min: 9.63,
        max: 29.66,
        default: 20.19,
        decimals: 2,
    },
    FeatureSpec {
        name: "r2",
        label: "Standing mean inspiratory/expiratory ratio",
        kind: FeatureKind::Continuous,
        group: FeatureGroup::Standing,
        min: 40.15,
        max: 87.38,
        default: 60.92,
        decimals: 2,
    },
    FeatureSpec {
        name: "nl21",
        label: "Standing first-mode nonlinearity index",
        kind: FeatureKind::Continuous,
        group: FeatureGroup::Standing,
        min: 0.66,
        max: 26.49,
        default: 6.60,
        decimals: 2,
    },
    FeatureSpec {
        name: "omega_mean21",
        label: "Standing first-mode dominant frequency",
        kind: FeatureKind::Continuous,
        group: FeatureGroup::Standing,
        min: 13.91,
        max: 57.83,
        default: 31.47,
        decimals: 2,
    },
];

/// Look up a feature by name.
#[must_use]
pub fn feature_spec(name: &str) -> Option<&'static FeatureSpec> {
    FEATURE_CATALOGUE.iter().find(|spec| spec.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    NotFinite,
    NotBinary,
    NotInteger,
    OutsideRange,
}

/// A value outside its documented range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeViolation {
    pub feature: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub reason: ViolationReason,
}

// Display deliberately omits the value so violations can be logged.
impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            ViolationReason::NotFinite => write!(f, "{} is not a finite number", self.feature),
            ViolationReason::NotBinary => write!(f, "{} must be 0 or 1", self.feature),
            ViolationReason::NotInteger => write!(f, "{} must be a whole number", self.feature),
            ViolationReason::OutsideRange => {
                write!(f, "{} outside [{}, {}]", self.feature, self.min, self.max)
            }
        }
    }
}

/// Check every catalogued feature present in `raw`.
///
/// Absent features are not reported here; the builder reports them.
#[must_use]
pub fn validate_ranges(raw: &RawInputs) -> Vec<RangeViolation> {
    FEATURE_CATALOGUE
        .iter()
        .filter_map(|spec| raw.get(spec.name).and_then(|v| spec.check(v)))
        .collect()
}

/// Ordered feature names recorded at training time.
///
/// The builder projects raw inputs into exactly this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureNames(Vec<String>);

impl FeatureNames {
    /// Create a feature order.
    ///
    /// # Errors
    /// Returns error if the list is empty or contains duplicates.
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        if names.is_empty() {
            return Err("feature name list is empty".to_string());
        }
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(format!("feature name at position {i} is blank"));
            }
            if names[..i].contains(name) {
                return Err(format!("duplicate feature name: {name}"));
            }
        }
        Ok(Self(names))
    }

    /// The catalogue's intake order.
    #[must_use]
    pub fn catalogue() -> Self {
        Self(FEATURE_CATALOGUE.iter().map(|s| s.name.to_string()).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

impl TryFrom<Vec<String>> for FeatureNames {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

/// Raw named inputs as supplied by the intake form.
///
/// Key order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInputs(HashMap<String, f64>);

impl RawInputs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inputs pre-filled with the intake form defaults.
    #[must_use]
    pub fn defaults() -> Self {
        FEATURE_CATALOGUE
            .iter()
            .map(|spec| (spec.name, spec.default))
            .collect()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.0.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for RawInputs {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
