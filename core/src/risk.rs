use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Upper bound of the Legitimate band (inclusive).
pub const LEGITIMATE_MAX: f64 = 0.4;
/// Upper bound of the Suspicious band (inclusive).
pub const SUSPICIOUS_MAX: f64 = 0.7;

/// Discrete risk category for a transaction. The bands are closed/half-open
/// intervals over [0, 1] with no gaps and no overlap; anything outside that
/// range (or no score at all) is `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RiskCategory {
    Legitimate,
    Suspicious,
    #[serde(rename = "High Risk")]
    HighRisk,
    Error,
}

impl RiskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskCategory::Legitimate => "Legitimate",
            RiskCategory::Suspicious => "Suspicious",
            RiskCategory::HighRisk => "High Risk",
            RiskCategory::Error => "Error",
        }
    }
}

/// A scored and categorized transaction. `category == Error` implies the
/// score is absent; a present score always lies in [0, 1] and matches the
/// band table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RiskAssessment {
    pub score: Option<f64>,
    pub category: RiskCategory,
}

impl RiskAssessment {
    pub fn error() -> Self {
        RiskAssessment {
            score: None,
            category: RiskCategory::Error,
        }
    }
}

/// Map a score to its category. Pure and total: out-of-range, non-finite and
/// absent scores all collapse to `Error` with the score cleared.
pub fn classify(score: Option<f64>) -> RiskAssessment {
    let Some(s) = score else {
        return RiskAssessment::error();
    };
    if !s.is_finite() || !(0.0..=1.0).contains(&s) {
        return RiskAssessment::error();
    }

    let category = if s <= LEGITIMATE_MAX {
        RiskCategory::Legitimate
    } else if s <= SUSPICIOUS_MAX {
        RiskCategory::Suspicious
    } else {
        RiskCategory::HighRisk
    };

    RiskAssessment {
        score: Some(s),
        category,
    }
}
