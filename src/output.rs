//! Finalized results handed to rendering consumers.
//!
//! [`ScoredAnalysis`] pairs a validated [`DocumentAnalysis`] with everything
//! the Risk Classifier derives from it. Derived values are computed once, at
//! finalization, and never written back into the analysis itself.

use crate::cache::{CacheStatus, Fingerprint};
use crate::risk::{classify, explain, recommend, Severity};
use crate::schema::{DocumentAnalysis, FieldResult, MissingPage};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// A validated analysis annotated with severities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAnalysis {
    /// The analysis exactly as validated.
    pub analysis: DocumentAnalysis,
    /// One entry per `analysis.expected_fields`, same order.
    pub fields: Vec<ScoredField>,
    /// One entry per `analysis.page_integrity.missing_pages`, same order.
    pub missing_pages: Vec<ScoredMissingPage>,
    /// Soft problems found in the model output. Passed through, not fixed.
    pub inconsistencies: Vec<Inconsistency>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredField {
    #[serde(flatten)]
    pub field: FieldResult,
    pub severity: Severity,
    pub reason: &'static str,
    pub recommendation: &'static str,
}

impl ScoredField {
    /// Scorecard wording for the extraction outcome.
    pub fn extraction_status(&self) -> &'static str {
        if self.field.present {
            "Extracted"
        } else {
            "No Extraction"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMissingPage {
    #[serde(flatten)]
    pub page: MissingPage,
    pub severity: Severity,
    pub recommendation: &'static str,
}

/// Disagreements inside a model answer that are reported, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Inconsistency {
    /// `isComplete` disagrees with whether `missingPages` is empty.
    #[serde(rename_all = "camelCase")]
    CompletenessMismatch {
        is_complete: bool,
        missing_pages: usize,
    },
    /// A missing page number lies beyond the reported page count.
    #[serde(rename_all = "camelCase")]
    MissingPageBeyondTotal { page: u32, total_pages: u32 },
    /// The same field name was reported more than once.
    #[serde(rename_all = "camelCase")]
    DuplicateField { field_name: String },
}

/// Count of fields per severity, as shown in the scorecard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl RiskDistribution {
    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    /// Share of `severity` in `0.0..=1.0`. Zero when there are no fields.
    pub fn share(&self, severity: Severity) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(severity) as f64 / self.total as f64
        }
    }
}

impl ScoredAnalysis {
    /// Annotate a validated analysis. Logs every inconsistency it finds.
    pub fn annotate(analysis: DocumentAnalysis) -> Self {
        let fields = analysis
            .expected_fields
            .iter()
            .map(|f| {
                let severity = classify(f.risk_level);
                ScoredField {
                    field: f.clone(),
                    severity,
                    reason: explain(f.present, f.risk_level),
                    recommendation: recommend(severity),
                }
            })
            .collect();

        let missing_pages = analysis
            .page_integrity
            .missing_pages
            .iter()
            .map(|p| {
                let severity = classify(p.risk_level);
                ScoredMissingPage {
                    page: p.clone(),
                    severity,
                    recommendation: recommend(severity),
                }
            })
            .collect();

        let inconsistencies = find_inconsistencies(&analysis);
        for issue in &inconsistencies {
            warn!("Inconsistent model output passed through: {:?}", issue);
        }

        Self {
            analysis,
            fields,
            missing_pages,
            inconsistencies,
        }
    }

    pub fn distribution(&self) -> RiskDistribution {
        let mut d = RiskDistribution {
            total: self.fields.len(),
            ..Default::default()
        };
        for f in &self.fields {
            match f.severity {
                Severity::High => d.high += 1,
                Severity::Medium => d.medium += 1,
                Severity::Low => d.low += 1,
            }
        }
        d
    }

    /// Highest severity over fields and missing pages, if there are any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.fields
            .iter()
            .map(|f| f.severity)
            .chain(self.missing_pages.iter().map(|p| p.severity))
            .max()
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }
}

fn find_inconsistencies(analysis: &DocumentAnalysis) -> Vec<Inconsistency> {
    let mut out = Vec::new();
    let pi = &analysis.page_integrity;

    if pi.is_complete != pi.missing_pages.is_empty() {
        out.push(Inconsistency::CompletenessMismatch {
            is_complete: pi.is_complete,
            missing_pages: pi.missing_pages.len(),
        });
    }

    for p in &pi.missing_pages {
        if pi.total_pages > 0 && p.expected_page_number > pi.total_pages {
            out.push(Inconsistency::MissingPageBeyondTotal {
                page: p.expected_page_number,
                total_pages: pi.total_pages,
            });
        }
    }

    let mut seen = HashSet::new();
    for f in &analysis.expected_fields {
        if !seen.insert(f.field_name.as_str()) {
            out.push(Inconsistency::DuplicateField {
                field_name: f.field_name.clone(),
            });
        }
    }

    out
}

/// Result of one [`crate::Analyzer::analyze`] call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutput {
    pub fingerprint: Fingerprint,
    pub scored: Arc<ScoredAnalysis>,
    pub cache: CacheStatus,
    pub duration_ms: u64,
}

impl AnalysisOutput {
    /// The plain analysis, in the wire schema.
    pub fn analysis(&self) -> &DocumentAnalysis {
        &self.scored.analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::MISSING_HIGH_TEMPLATE;
    use crate::schema::PageIntegrity;

    fn field(name: &str, present: bool, risk: f64) -> FieldResult {
        FieldResult {
            field_name: name.into(),
            present,
            risk_level: risk,
        }
    }

    fn analysis(fields: Vec<FieldResult>, is_complete: bool, missing: Vec<MissingPage>) -> DocumentAnalysis {
        DocumentAnalysis {
            has_signature: true,
            expected_fields: fields,
            page_integrity: PageIntegrity {
                is_complete,
                total_pages: 3,
                missing_pages: missing,
            },
            notes: None,
        }
    }

    #[test]
    fn missing_signature_date_is_high() {
        let scored = ScoredAnalysis::annotate(analysis(
            vec![field("Signature Date", false, 85.0)],
            true,
            vec![],
        ));
        let f = &scored.fields[0];
        assert_eq!(f.severity, Severity::High);
        assert_eq!(f.reason, MISSING_HIGH_TEMPLATE);
        assert_eq!(f.recommendation, "Immediate attention required");
        assert_eq!(f.extraction_status(), "No Extraction");
        assert!(scored.is_consistent());
    }

    #[test]
    fn annotation_preserves_order_and_input() {
        let input = analysis(
            vec![field("B", true, 10.0), field("A", false, 50.0), field("C", false, 90.0)],
            true,
            vec![],
        );
        let scored = ScoredAnalysis::annotate(input.clone());
        assert_eq!(scored.analysis, input);
        let names: Vec<_> = scored.fields.iter().map(|f| f.field.field_name.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
    }

    #[test]
    fn distribution_counts_each_band() {
        let scored = ScoredAnalysis::annotate(analysis(
            vec![
                field("a", true, 5.0),
                field("b", true, 29.0),
                field("c", false, 30.0),
                field("d", false, 70.0),
            ],
            true,
            vec![],
        ));
        let d = scored.distribution();
        assert_eq!((d.high, d.medium, d.low, d.total), (1, 1, 2, 4));
        assert_eq!(d.share(Severity::Low), 0.5);
        assert_eq!(RiskDistribution::default().share(Severity::High), 0.0);
    }

    #[test]
    fn completeness_mismatch_is_reported_not_fixed() {
        let page = MissingPage {
            expected_page_number: 2,
            risk_level: 40.0,
            reason: "numbering gap".into(),
        };
        let scored = ScoredAnalysis::annotate(analysis(vec![], true, vec![page]));
        assert!(scored.analysis.page_integrity.is_complete, "passed through verbatim");
        assert_eq!(
            scored.inconsistencies,
            vec![Inconsistency::CompletenessMismatch {
                is_complete: true,
                missing_pages: 1
            }]
        );
        assert_eq!(scored.missing_pages[0].severity, Severity::Medium);
        assert_eq!(scored.worst_severity(), Some(Severity::Medium));
    }

    #[test]
    fn duplicate_fields_and_out_of_range_pages_reported() {
        let page = MissingPage {
            expected_page_number: 9,
            risk_level: 80.0,
            reason: "gap".into(),
        };
        let scored = ScoredAnalysis::annotate(analysis(
            vec![field("Date", true, 1.0), field("Date", false, 60.0)],
            false,
            vec![page],
        ));
        assert!(scored.inconsistencies.contains(&Inconsistency::MissingPageBeyondTotal {
            page: 9,
            total_pages: 3
        }));
        assert!(scored.inconsistencies.contains(&Inconsistency::DuplicateField {
            field_name: "Date".into()
        }));
    }

    #[test]
    fn scored_field_serialises_flat() {
        let scored = ScoredAnalysis::annotate(analysis(vec![field("Date", false, 85.0)], true, vec![]));
        let v = serde_json::to_value(&scored).unwrap();
        assert_eq!(v["fields"][0]["fieldName"], "Date");
        assert_eq!(v["fields"][0]["severity"], "High");
        assert_eq!(v["analysis"]["expectedFields"][0]["riskLevel"], 85.0);
    }
}
