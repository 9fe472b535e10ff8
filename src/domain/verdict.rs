//! Risk score and verdict types.
//!
//! Represents the output of the COPD risk classifier.

use serde::{Deserialize, Serialize};

use super::PredictionError;

/// Probability at or above which a patient is classified HIGH_RISK.
pub const RISK_THRESHOLD: f64 = 0.5;

/// Clinical usage notice shown alongside results.
pub const CLINICAL_NOTICE: &str = "Clinical use notice:\n\
    1. This prediction is for reference only and does not replace a professional medical diagnosis.\n\
    2. High-risk patients should confirm the result with a pulmonary function test.\n\
    3. Reported model performance: validation AUC = 0.80.";

/// Probability of the COPD-positive class, in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct RiskScore(f64);

impl RiskScore {
    /// # Errors
    /// Returns `PredictionError::Inference` if `probability` is not a finite
    /// value in [0, 1].
    pub fn new(probability: f64) -> Result<Self, PredictionError> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(PredictionError::Inference(format!(
                "classifier produced invalid probability {probability}"
            )));
        }
        Ok(Self(probability))
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Probability as a percentage with one decimal, e.g. `"37.6%"`.
    #[must_use]
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.0 * 100.0)
    }
}

/// Two-valued risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Probability >= 0.5
    HighRisk,
    /// Probability < 0.5
    LowRisk,
}

impl RiskLevel {
    /// Get a human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::HighRisk => "High risk (COPD)",
            Self::LowRisk => "Low risk (non-COPD)",
        }
    }

    /// Follow-up guidance for display.
    #[must_use]
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::HighRisk => "recommend pulmonary function test",
            Self::LowRisk => "recommend routine monitoring",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighRisk => write!(f, "HIGH_RISK"),
            Self::LowRisk => write!(f, "LOW_RISK"),
        }
    }
}

/// Final decision with the score it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskVerdict {
    level: RiskLevel,
    score: RiskScore,
}

impl RiskVerdict {
    #[must_use]
    pub fn level(&self) -> RiskLevel {
        self.level
    }

    #[must_use]
    pub fn score(&self) -> RiskScore {
        self.score
    }

    /// Render the verdict for display.
    #[must_use]
    pub fn report(&self) -> PredictionReport {
        PredictionReport {
            verdict: self.level,
            probability: self.score.value(),
            probability_percent: self.score.percent(),
            label: self.level.label().to_string(),
            guidance: self.level.guidance().to_string(),
        }
    }
}

/// Threshold a score into a verdict. A score of exactly 0.5 is HIGH_RISK.
#[must_use]
pub fn interpret(score: RiskScore) -> RiskVerdict {
    let level = if score.value() >= RISK_THRESHOLD {
        RiskLevel::HighRisk
    } else {
        RiskLevel::LowRisk
    };
    RiskVerdict { level, score }
}

/// Rendered prediction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub verdict: RiskLevel,
    pub probability: f64,
    pub probability_percent: String,
    pub label: String,
    pub guidance: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_of(p: f64) -> RiskLevel {
        interpret(RiskScore::new(p).expect("valid score")).level()
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(level_of(0.5), RiskLevel::HighRisk);
        assert_eq!(level_of(0.4999), RiskLevel::LowRisk);
        assert_eq!(level_of(1.0), RiskLevel::HighRisk);
        assert_eq!(level_of(0.0), RiskLevel::LowRisk);
    }

    #[test]
    fn test_score_rejects_invalid_probabilities() {
        assert!(RiskScore::new(-0.01).is_err());
        assert!(RiskScore::new(1.01).is_err());
        assert!(RiskScore::new(f64::NAN).is_err());
    }

    #[test]
    fn test_report_rendering() {
        let verdict = interpret(RiskScore::new(0.3764).expect("valid score"));
        let report = verdict.report();

        assert_eq!(report.verdict, RiskLevel::LowRisk);
        assert_eq!(report.probability_percent, "37.6%");
        assert_eq!(report.label, "Low risk (non-COPD)");
        assert_eq!(report.guidance, "recommend routine monitoring");
    }

    #[test]
    fn test_report_serializes_verdict_name() {
        let verdict = interpret(RiskScore::new(0.91).expect("valid score"));
        let json = serde_json::to_value(verdict.report()).expect("serialize");

        assert_eq!(json["verdict"], "HIGH_RISK");
        assert_eq!(json["guidance"], "recommend pulmonary function test");
    }
}
