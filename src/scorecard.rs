//! Plain-text scorecard for a finalized analysis.
//!
//! Rendering is read-only: everything shown comes from a [`ScoredAnalysis`],
//! so severities printed here always match the ones the classifier produced.

use crate::output::{Inconsistency, ScoredAnalysis};
use crate::risk::Severity;
use std::fmt::Write;

/// Width, in characters, of a full distribution bar.
const BAR_WIDTH: usize = 30;

/// Render `scored` as a terminal-friendly scorecard.
pub fn render(scored: &ScoredAnalysis) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_scorecard(&mut out, scored);
    out
}

fn write_scorecard(out: &mut String, scored: &ScoredAnalysis) -> std::fmt::Result {
    let analysis = &scored.analysis;
    let pi = &analysis.page_integrity;

    writeln!(out, "Document Analysis Scorecard")?;
    writeln!(out, "===========================")?;
    writeln!(out)?;

    let completeness = if pi.is_complete { "Complete" } else { "Incomplete" };
    writeln!(out, "Pages:      {} ({})", pi.total_pages, completeness)?;
    let signature = if analysis.has_signature {
        "Present"
    } else {
        "Missing"
    };
    writeln!(out, "Signature:  {}", signature)?;
    writeln!(out)?;

    let dist = scored.distribution();
    writeln!(out, "Risk Distribution")?;
    for severity in Severity::ALL {
        let count = dist.count(severity);
        let filled = (dist.share(severity) * BAR_WIDTH as f64).round() as usize;
        writeln!(
            out,
            "  {:<12} {:<width$} {}",
            format!("{} Risk", severity),
            "#".repeat(filled),
            count,
            width = BAR_WIDTH
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Document Fields (Total: {})", dist.total)?;
    if scored.fields.is_empty() {
        writeln!(out, "  (none reported)")?;
    }
    for f in &scored.fields {
        let mark = if f.field.present { "✓" } else { "✗" };
        writeln!(
            out,
            "  [{:<6}] {} {} ({:.0}) - {}",
            f.severity.label(),
            mark,
            f.field.field_name,
            f.field.risk_level,
            f.extraction_status()
        )?;
        writeln!(out, "           {}", f.reason)?;
        writeln!(out, "           -> {}", f.recommendation)?;
    }

    if !scored.missing_pages.is_empty() {
        writeln!(out)?;
        writeln!(out, "Missing Pages")?;
        for p in &scored.missing_pages {
            writeln!(
                out,
                "  [{:<6}] page {} ({:.0}) - {}",
                p.severity.label(),
                p.page.expected_page_number,
                p.page.risk_level,
                p.page.reason
            )?;
            writeln!(out, "           -> {}", p.recommendation)?;
        }
    }

    if let Some(notes) = analysis.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        writeln!(out)?;
        writeln!(out, "Notes")?;
        for line in notes.lines() {
            writeln!(out, "  {}", line)?;
        }
    }

    if !scored.inconsistencies.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings")?;
        for issue in &scored.inconsistencies {
            writeln!(out, "  ! {}", describe(issue))?;
        }
    }

    Ok(())
}

fn describe(issue: &Inconsistency) -> String {
    match issue {
        Inconsistency::CompletenessMismatch {
            is_complete,
            missing_pages,
        } => format!(
            "document reported {} but lists {} missing page(s)",
            if *is_complete { "complete" } else { "incomplete" },
            missing_pages
        ),
        Inconsistency::MissingPageBeyondTotal { page, total_pages } => format!(
            "missing page {} is beyond the reported {} page(s)",
            page, total_pages
        ),
        Inconsistency::DuplicateField { field_name } => {
            format!("field '{}' was reported more than once", field_name)
        }
    }
}
