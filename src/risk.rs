//! Risk classification: continuous 0–100 scores → discrete severities.
//!
//! Everything here is a pure function so the UI mapping can be tested
//! exhaustively without a model. Bands are lower-inclusive:
//!
//! | Score        | Severity |
//! |--------------|----------|
//! | `< 30`       | Low      |
//! | `30 ≤ s < 70`| Medium   |
//! | `≥ 70`       | High     |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of the Medium band.
pub const MEDIUM_THRESHOLD: f64 = 30.0;
/// Lower bound of the High band.
pub const HIGH_THRESHOLD: f64 = 70.0;

/// Discrete risk tier shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// All tiers, highest first (scorecard display order).
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a risk score to its severity tier.
pub fn classify(risk_level: f64) -> Severity {
    if risk_level >= HIGH_THRESHOLD {
        Severity::High
    } else if risk_level >= MEDIUM_THRESHOLD {
        Severity::Medium
    } else {
        Severity::Low
    }
}

pub const PRESENT_TEMPLATE: &str =
    "Field was found in the document and extracted.";
pub const MISSING_HIGH_TEMPLATE: &str =
    "Field is missing and very likely absent from the document; it could not be extracted.";
pub const MISSING_MEDIUM_TEMPLATE: &str =
    "Field was not found; it may be absent or unreadable and should be checked by hand.";
pub const MISSING_LOW_TEMPLATE: &str =
    "Field was not found, but it is probably optional or located elsewhere.";

/// Display-only explanation for a field. Never parsed back.
pub fn explain(present: bool, risk_level: f64) -> &'static str {
    if present {
        return PRESENT_TEMPLATE;
    }
    match classify(risk_level) {
        Severity::High => MISSING_HIGH_TEMPLATE,
        Severity::Medium => MISSING_MEDIUM_TEMPLATE,
        Severity::Low => MISSING_LOW_TEMPLATE,
    }
}

/// Suggested action for a severity tier.
pub fn recommend(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "Immediate attention required",
        Severity::Medium => "Review for compliance",
        Severity::Low => "No immediate action needed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_the_scale() {
        for tenth in 0..=1000 {
            let r = tenth as f64 / 10.0;
            let expected = if r < 30.0 {
                Severity::Low
            } else if r < 70.0 {
                Severity::Medium
            } else {
                Severity::High
            };
            assert_eq!(classify(r), expected, "risk {r}");
        }
    }

    #[test]
    fn boundaries_are_lower_inclusive() {
        assert_eq!(classify(0.0), Severity::Low);
        assert_eq!(classify(29.999), Severity::Low);
        assert_eq!(classify(30.0), Severity::Medium);
        assert_eq!(classify(69.999), Severity::Medium);
        assert_eq!(classify(70.0), Severity::High);
        assert_eq!(classify(100.0), Severity::High);
    }

    #[test]
    fn explain_selects_template_by_presence_and_severity() {
        assert_eq!(explain(false, 85.0), MISSING_HIGH_TEMPLATE);
        assert_eq!(explain(false, 50.0), MISSING_MEDIUM_TEMPLATE);
        assert_eq!(explain(false, 10.0), MISSING_LOW_TEMPLATE);
        assert_eq!(explain(true, 85.0), PRESENT_TEMPLATE);
        assert_eq!(explain(true, 0.0), PRESENT_TEMPLATE);
    }

    #[test]
    fn recommendations() {
        assert_eq!(recommend(Severity::High), "Immediate attention required");
        assert_eq!(recommend(Severity::Medium), "Review for compliance");
        assert_eq!(recommend(Severity::Low), "No immediate action needed");
    }

    #[test]
    fn severity_orders_low_to_high() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(Severity::High.to_string(), "High");
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"Medium\"");
    }
}
