//! Instructions sent to the extraction model.
//!
//! Centralising every prompt here keeps one source of truth for the analysis
//! task and lets unit tests inspect the text without a model.
//!
//! Callers can override both instructions via
//! [`crate::config::AnalysisConfig::system_prompt`] and
//! [`crate::config::AnalysisConfig::user_prompt`]; the constants here are used
//! only when no override is provided.

/// Default system instruction: the fixed role of the analysis task.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a document analyzer. Your job is to analyze \
documents for signatures, expected fields, and page integrity. Check for any missing, blank, or \
corrupted pages. Examine page numbers, headers/footers, and content flow to detect potential \
missing pages. Also analyze for signatures and expected fields, determining if they are present \
and providing a risk level for each field.";

/// Default user instruction accompanying the attached document.
pub const DEFAULT_USER_PROMPT: &str = "Analyze this document for completeness, missing pages, \
signatures, and expected fields. Check page numbers, content flow, and any signs of missing \
pages. Also determine which fields are present or missing, and provide a risk level for each \
field.";

/// Output contract appended to the user instruction.
///
/// The placeholder `{schema}` is replaced with the pretty-printed JSON Schema.
const OUTPUT_CONTRACT: &str = r#"Respond with a single JSON object and nothing else. It must match this JSON Schema:

{schema}

Rules:
- Every "riskLevel" is a number from 0 to 100 where higher means riskier (0 = certainly fine, 100 = certainly missing or invalid). Do not use a 0-1 scale.
- "isComplete" must be true only when "missingPages" is empty.
- Each "fieldName" appears at most once.
- Do not wrap the JSON in markdown fences."#;

/// Render the output contract for the given schema.
pub fn output_contract(schema: &serde_json::Value) -> String {
    let pretty = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    OUTPUT_CONTRACT.replace("{schema}", &pretty)
}
