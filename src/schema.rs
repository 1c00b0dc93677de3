//! The structural contract for a document analysis.
//!
//! Model output is arbitrary JSON. It is converted into the strict record
//! types below at this boundary and nowhere else: nothing past
//! [`validate`] ever touches an unvalidated `serde_json::Value`.
//!
//! ## Risk scale
//!
//! Every numeric score is a `riskLevel` on a **0–100 scale where higher means
//! riskier** (the risk that a field is missing or wrongly extracted, or that a
//! page is missing). Earlier revisions of the prompt used a `confidence` key
//! with a similar range but different meaning; that key is refused rather
//! than reinterpreted, and a finished document whose scores all sit in
//! `0..=1` with fractions is refused as a 0–1 scale.
//!
//! ## Full vs partial validation
//!
//! [`validate`] requires every mandatory key. [`validate_partial`] accepts a
//! structurally incomplete fragment (as assembled from a token stream) and
//! checks only the keys that are already there, using the same rules.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Lowest allowed risk score.
pub const RISK_MIN: f64 = 0.0;
/// Highest allowed risk score.
pub const RISK_MAX: f64 = 100.0;

/// The root result of analysing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub has_signature: bool,
    pub expected_fields: Vec<FieldResult>,
    pub page_integrity: PageIntegrity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One expected field and whether the model found it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResult {
    pub field_name: String,
    pub present: bool,
    /// 0–100, risk that the field is missing or erroneously extracted.
    pub risk_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageIntegrity {
    pub is_complete: bool,
    pub total_pages: u32,
    pub missing_pages: Vec<MissingPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingPage {
    pub expected_page_number: u32,
    /// 0–100, risk that this page really is missing.
    pub risk_level: f64,
    pub reason: String,
}

// ── Partial shapes ───────────────────────────────────────────────────────

/// A valid-so-far snapshot of a document analysis still being streamed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialAnalysis {
    pub has_signature: Option<bool>,
    pub expected_fields: Vec<PartialField>,
    pub page_integrity: Option<PartialPageIntegrity>,
    pub notes: Option<String>,
    #[serde(skip)]
    complete: Completeness,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialField {
    pub field_name: Option<String>,
    pub present: Option<bool>,
    pub risk_level: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPageIntegrity {
    pub is_complete: Option<bool>,
    pub total_pages: Option<u32>,
    pub missing_pages: Vec<PartialMissingPage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialMissingPage {
    pub expected_page_number: Option<u32>,
    pub risk_level: Option<f64>,
    pub reason: Option<String>,
}

/// Presence of the two required arrays, which cannot be told apart from
/// "empty" once collected into a `Vec`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Completeness {
    has_fields_array: bool,
    has_missing_pages_array: bool,
}

impl PartialAnalysis {
    /// Number of expected fields received so far.
    pub fn field_count(&self) -> usize {
        self.expected_fields.len()
    }

    /// Convert into a full analysis if every required key is present.
    pub fn complete(&self) -> Option<DocumentAnalysis> {
        if !self.complete.has_fields_array {
            return None;
        }
        let expected_fields = self
            .expected_fields
            .iter()
            .map(|f| {
                Some(FieldResult {
                    field_name: f.field_name.clone()?,
                    present: f.present?,
                    risk_level: f.risk_level?,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        let pi = self.page_integrity.as_ref()?;
        if !self.complete.has_missing_pages_array {
            return None;
        }
        let missing_pages = pi
            .missing_pages
            .iter()
            .map(|p| {
                Some(MissingPage {
                    expected_page_number: p.expected_page_number?,
                    risk_level: p.risk_level?,
                    reason: p.reason.clone()?,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(DocumentAnalysis {
            has_signature: self.has_signature?,
            expected_fields,
            page_integrity: PageIntegrity {
                is_complete: pi.is_complete?,
                total_pages: pi.total_pages?,
                missing_pages,
            },
            notes: self.notes.clone(),
        })
    }
}

impl From<&DocumentAnalysis> for PartialAnalysis {
    fn from(full: &DocumentAnalysis) -> Self {
        Self {
            has_signature: Some(full.has_signature),
            expected_fields: full
                .expected_fields
                .iter()
                .map(|f| PartialField {
                    field_name: Some(f.field_name.clone()),
                    present: Some(f.present),
                    risk_level: Some(f.risk_level),
                })
                .collect(),
            page_integrity: Some(PartialPageIntegrity {
                is_complete: Some(full.page_integrity.is_complete),
                total_pages: Some(full.page_integrity.total_pages),
                missing_pages: full
                    .page_integrity
                    .missing_pages
                    .iter()
                    .map(|p| PartialMissingPage {
                        expected_page_number: Some(p.expected_page_number),
                        risk_level: Some(p.risk_level),
                        reason: Some(p.reason.clone()),
                    })
                    .collect(),
            }),
            notes: full.notes.clone(),
            complete: Completeness {
                has_fields_array: true,
                has_missing_pages_array: true,
            },
        }
    }
}

/// Outcome of validating a streamed fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialStatus {
    /// Consistent so far, but required keys are still missing.
    ValidSoFar(PartialAnalysis),
    /// Every required key is present and valid.
    Complete(DocumentAnalysis),
    /// A key that is present violates the contract.
    Invalid(SchemaError),
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Validate a finished model response into a [`DocumentAnalysis`].
pub fn validate(raw: &Value) -> Result<DocumentAnalysis, SchemaError> {
    let partial = walk(raw, Mode::Full)?;
    let analysis = partial.complete().ok_or_else(|| SchemaError::MissingField {
        path: "$".to_string(),
    })?;
    check_scale(&analysis)?;
    Ok(analysis)
}

/// Validate a possibly incomplete fragment of a model response.
pub fn validate_partial(raw: &Value) -> PartialStatus {
    match walk(raw, Mode::Partial) {
        Err(e) => PartialStatus::Invalid(e),
        Ok(partial) => match partial.complete() {
            Some(full) => PartialStatus::Complete(full),
            None => PartialStatus::ValidSoFar(partial),
        },
    }
}

/// JSON Schema describing the object the model must return.
///
/// Sent to the extraction capability alongside the instructions.
pub fn target_schema() -> Value {
    let risk = json!({ "type": "number", "minimum": RISK_MIN, "maximum": RISK_MAX });
    json!({
        "type": "object",
        "required": ["hasSignature", "expectedFields", "pageIntegrity"],
        "properties": {
            "hasSignature": {
                "type": "boolean",
                "description": "Whether the document contains a signature"
            },
            "expectedFields": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["fieldName", "present", "riskLevel"],
                    "properties": {
                        "fieldName": { "type": "string", "description": "Name of the expected field" },
                        "present": { "type": "boolean", "description": "Whether the field is present in the document" },
                        "riskLevel": merge(&risk, "Risk (0-100) that this field is missing or invalid")
                    }
                }
            },
            "pageIntegrity": {
                "type": "object",
                "required": ["isComplete", "totalPages", "missingPages"],
                "properties": {
                    "isComplete": { "type": "boolean", "description": "Whether all pages are present" },
                    "totalPages": { "type": "integer", "minimum": 0 },
                    "missingPages": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["expectedPageNumber", "riskLevel", "reason"],
                            "properties": {
                                "expectedPageNumber": { "type": "integer", "minimum": 0 },
                                "riskLevel": merge(&risk, "Risk (0-100) that this page is missing"),
                                "reason": { "type": "string" }
                            }
                        }
                    }
                }
            },
            "notes": { "type": "string", "description": "Any additional notes about the document analysis" }
        }
    })
}

fn merge(base: &Value, description: &str) -> Value {
    let mut v = base.clone();
    if let Some(obj) = v.as_object_mut() {
        obj.insert("description".into(), Value::String(description.into()));
    }
    v
}

// ── Walker ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Full,
    Partial,
}

fn walk(raw: &Value, mode: Mode) -> Result<PartialAnalysis, SchemaError> {
    let root = as_object(raw, "$")?;
    let mut out = PartialAnalysis {
        has_signature: bool_at(root, "hasSignature", "", mode)?,
        ..Default::default()
    };

    if let Some(v) = required(root, "expectedFields", "", mode)? {
        let items = as_array(v, "expectedFields")?;
        out.complete.has_fields_array = true;
        for (i, item) in items.iter().enumerate() {
            let path = format!("expectedFields[{i}]");
            let obj = as_object(item, &path)?;
            out.expected_fields.push(PartialField {
                field_name: string_at(obj, "fieldName", &path, mode)?,
                present: bool_at(obj, "present", &path, mode)?,
                risk_level: risk_at(obj, &path, mode)?,
            });
        }
    }

    if let Some(v) = required(root, "pageIntegrity", "", mode)? {
        let path = "pageIntegrity";
        let obj = as_object(v, path)?;
        let mut pi = PartialPageIntegrity {
            is_complete: bool_at(obj, "isComplete", path, mode)?,
            total_pages: count_at(obj, "totalPages", path, mode)?,
            missing_pages: Vec::new(),
        };
        if let Some(pages) = required(obj, "missingPages", path, mode)? {
            let items = as_array(pages, "pageIntegrity.missingPages")?;
            out.complete.has_missing_pages_array = true;
            for (i, item) in items.iter().enumerate() {
                let path = format!("pageIntegrity.missingPages[{i}]");
                let page = as_object(item, &path)?;
                pi.missing_pages.push(PartialMissingPage {
                    expected_page_number: count_at(page, "expectedPageNumber", &path, mode)?,
                    risk_level: risk_at(page, &path, mode)?,
                    reason: string_at(page, "reason", &path, mode)?,
                });
            }
        }
        out.page_integrity = Some(pi);
    }

    out.notes = match root.get("notes") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(SchemaError::WrongType {
                path: "notes".into(),
                expected: "string",
            })
        }
    };

    Ok(out)
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn as_object<'a>(v: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    v.as_object().ok_or_else(|| SchemaError::WrongType {
        path: path.to_string(),
        expected: "object",
    })
}

fn as_array<'a>(v: &'a Value, path: &str) -> Result<&'a Vec<Value>, SchemaError> {
    v.as_array().ok_or_else(|| SchemaError::WrongType {
        path: path.to_string(),
        expected: "array",
    })
}

/// Look up a required key. Absence is an error only in full mode.
fn required<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    parent: &str,
    mode: Mode,
) -> Result<Option<&'a Value>, SchemaError> {
    match obj.get(key) {
        Some(v) => Ok(Some(v)),
        None if mode == Mode::Partial => Ok(None),
        None => Err(SchemaError::MissingField {
            path: join(parent, key),
        }),
    }
}

fn bool_at(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    mode: Mode,
) -> Result<Option<bool>, SchemaError> {
    required(obj, key, parent, mode)?
        .map(|v| {
            v.as_bool().ok_or_else(|| SchemaError::WrongType {
                path: join(parent, key),
                expected: "boolean",
            })
        })
        .transpose()
}

fn string_at(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    mode: Mode,
) -> Result<Option<String>, SchemaError> {
    required(obj, key, parent, mode)?
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| SchemaError::WrongType {
                path: join(parent, key),
                expected: "string",
            })
        })
        .transpose()
}

fn count_at(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    mode: Mode,
) -> Result<Option<u32>, SchemaError> {
    required(obj, key, parent, mode)?
        .map(|v| {
            // Models sometimes write counts as `3.0`.
            v.as_u64()
                .or_else(|| {
                    v.as_f64()
                        .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                        .map(|f| f as u64)
                })
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| SchemaError::WrongType {
                    path: join(parent, key),
                    expected: "non-negative integer",
                })
        })
        .transpose()
}

fn risk_at(obj: &Map<String, Value>, parent: &str, mode: Mode) -> Result<Option<f64>, SchemaError> {
    if !obj.contains_key("riskLevel") && obj.contains_key("confidence") {
        return Err(SchemaError::LegacyConfidence {
            path: join(parent, "confidence"),
        });
    }
    let path = join(parent, "riskLevel");
    let Some(v) = required(obj, "riskLevel", parent, mode)? else {
        return Ok(None);
    };
    let n = v.as_f64().ok_or_else(|| SchemaError::WrongType {
        path: path.clone(),
        expected: "number",
    })?;
    if !(RISK_MIN..=RISK_MAX).contains(&n) {
        return Err(SchemaError::OutOfRange {
            path,
            value: n,
            min: RISK_MIN,
            max: RISK_MAX,
        });
    }
    Ok(Some(n))
}

/// A 0–1 answer shows up as scores that never exceed 1, some fractional,
/// on a document that does have risky entries: a missing field or a missing
/// page scored below 1 on a 0–100 scale is nonsense. A clean document whose
/// scores are all tiny is left alone.
fn check_scale(analysis: &DocumentAnalysis) -> Result<(), SchemaError> {
    let scores: Vec<f64> = analysis
        .expected_fields
        .iter()
        .map(|f| f.risk_level)
        .chain(
            analysis
                .page_integrity
                .missing_pages
                .iter()
                .map(|p| p.risk_level),
        )
        .collect();

    let max = scores.iter().copied().fold(RISK_MIN, f64::max);
    let fractional = scores.iter().any(|s| s.fract() != 0.0);
    let has_risky_entry = analysis.expected_fields.iter().any(|f| !f.present)
        || !analysis.page_integrity.missing_pages.is_empty();
    if !scores.is_empty() && max <= 1.0 && fractional && has_risky_entry {
        return Err(SchemaError::ScaleMismatch { max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        json!({
            "hasSignature": true,
            "expectedFields": [
                { "fieldName": "Signature Date", "present": false, "riskLevel": 85 },
                { "fieldName": "Account Number", "present": true, "riskLevel": 5.5 },
                { "fieldName": "Beneficiary", "present": true, "riskLevel": 30 }
            ],
            "pageIntegrity": {
                "isComplete": false,
                "totalPages": 4,
                "missingPages": [
                    { "expectedPageNumber": 3, "riskLevel": 72, "reason": "Page numbering jumps from 2 to 4" }
                ]
            },
            "notes": "Scanned copy, low contrast."
        })
    }

    #[test]
    fn full_document_validates() {
        let a = validate(&sample()).expect("valid");
        assert!(a.has_signature);
        assert_eq!(a.expected_fields.len(), 3);
        assert_eq!(a.expected_fields[0].field_name, "Signature Date");
        assert_eq!(a.page_integrity.total_pages, 4);
        assert_eq!(a.page_integrity.missing_pages[0].expected_page_number, 3);
        assert_eq!(a.notes.as_deref(), Some("Scanned copy, low contrast."));
    }

    #[test]
    fn round_trip_preserves_order_and_values() {
        let a = validate(&sample()).unwrap();
        let again = validate(&serde_json::to_value(&a).unwrap()).unwrap();
        assert_eq!(a, again);
        let names: Vec<_> = again.expected_fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, ["Signature Date", "Account Number", "Beneficiary"]);
    }

    #[test]
    fn serialises_camel_case() {
        let a = validate(&sample()).unwrap();
        let v = serde_json::to_value(&a).unwrap();
        assert!(v.get("hasSignature").is_some());
        assert!(v["pageIntegrity"].get("missingPages").is_some());
        assert!(v["expectedFields"][0].get("riskLevel").is_some());
    }

    #[test]
    fn notes_null_or_absent_is_none() {
        let mut v = sample();
        v["notes"] = Value::Null;
        assert_eq!(validate(&v).unwrap().notes, None);
        v.as_object_mut().unwrap().remove("notes");
        assert_eq!(validate(&v).unwrap().notes, None);
    }

    #[test]
    fn risk_out_of_range_rejected() {
        let mut v = sample();
        v["expectedFields"][1]["riskLevel"] = json!(101);
        match validate(&v) {
            Err(SchemaError::OutOfRange { path, .. }) => {
                assert_eq!(path, "expectedFields[1].riskLevel")
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }

        let mut v = sample();
        v["pageIntegrity"]["missingPages"][0]["riskLevel"] = json!(-1);
        assert!(matches!(validate(&v), Err(SchemaError::OutOfRange { .. })));
    }

    #[test]
    fn missing_boolean_rejected() {
        let mut v = sample();
        v.as_object_mut().unwrap().remove("hasSignature");
        assert_eq!(
            validate(&v),
            Err(SchemaError::MissingField {
                path: "hasSignature".into()
            })
        );
    }

    #[test]
    fn non_array_fields_rejected() {
        let mut v = sample();
        v["expectedFields"] = json!({ "fieldName": "x" });
        assert!(matches!(
            validate(&v),
            Err(SchemaError::WrongType { expected: "array", .. })
        ));

        let mut v = sample();
        v["expectedFields"] = json!(["Signature Date"]);
        assert!(matches!(
            validate(&v),
            Err(SchemaError::WrongType { expected: "object", .. })
        ));
    }

    #[test]
    fn negative_total_pages_rejected() {
        let mut v = sample();
        v["pageIntegrity"]["totalPages"] = json!(-2);
        assert!(matches!(
            validate(&v),
            Err(SchemaError::WrongType { expected: "non-negative integer", .. })
        ));
    }

    #[test]
    fn legacy_confidence_rejected() {
        let v = json!({
            "hasSignature": false,
            "expectedFields": [{ "fieldName": "Date", "present": false, "confidence": 90 }],
            "pageIntegrity": { "isComplete": true, "totalPages": 1, "missingPages": [] }
        });
        assert!(matches!(validate(&v), Err(SchemaError::LegacyConfidence { .. })));
        assert!(matches!(
            validate_partial(&v),
            PartialStatus::Invalid(SchemaError::LegacyConfidence { .. })
        ));
    }

    #[test]
    fn zero_to_one_scale_rejected() {
        let v = json!({
            "hasSignature": true,
            "expectedFields": [
                { "fieldName": "Date", "present": false, "riskLevel": 0.85 },
                { "fieldName": "Name", "present": true, "riskLevel": 0.1 }
            ],
            "pageIntegrity": { "isComplete": true, "totalPages": 1, "missingPages": [] }
        });
        assert!(matches!(validate(&v), Err(SchemaError::ScaleMismatch { .. })));
    }

    #[test]
    fn integer_low_scores_are_not_a_scale_mismatch() {
        let v = json!({
            "hasSignature": true,
            "expectedFields": [
                { "fieldName": "Date", "present": true, "riskLevel": 0 },
                { "fieldName": "Name", "present": true, "riskLevel": 1 }
            ],
            "pageIntegrity": { "isComplete": true, "totalPages": 1, "missingPages": [] }
        });
        assert!(validate(&v).is_ok());
    }

    #[test]
    fn low_risk_document_with_fractional_scores_is_valid() {
        let v = json!({
            "hasSignature": true,
            "expectedFields": [
                { "fieldName": "Date", "present": true, "riskLevel": 0.5 },
                { "fieldName": "Name", "present": true, "riskLevel": 0 }
            ],
            "pageIntegrity": { "isComplete": true, "totalPages": 2, "missingPages": [] }
        });
        let analysis = validate(&v).unwrap();
        assert_eq!(analysis.expected_fields[0].risk_level, 0.5);
    }

    #[test]
    fn missing_page_scored_below_one_is_a_scale_mismatch() {
        let v = json!({
            "hasSignature": true,
            "expectedFields": [{ "fieldName": "Name", "present": true, "riskLevel": 0.05 }],
            "pageIntegrity": {
                "isComplete": false,
                "totalPages": 3,
                "missingPages": [{ "expectedPageNumber": 2, "riskLevel": 0.9, "reason": "Gap" }]
            }
        });
        assert!(matches!(validate(&v), Err(SchemaError::ScaleMismatch { .. })));
    }

    #[test]
    fn whole_number_float_counts_accepted() {
        let mut v = sample();
        v["pageIntegrity"]["totalPages"] = json!(4.0);
        v["pageIntegrity"]["missingPages"][0]["expectedPageNumber"] = json!(3.0);
        let analysis = validate(&v).unwrap();
        assert_eq!(analysis.page_integrity.total_pages, 4);
        assert_eq!(analysis.page_integrity.missing_pages[0].expected_page_number, 3);

        v["pageIntegrity"]["totalPages"] = json!(2.5);
        assert!(matches!(
            validate(&v),
            Err(SchemaError::WrongType { expected: "non-negative integer", .. })
        ));
    }

    #[test]
    fn unknown_keys_ignored() {
        let mut v = sample();
        v["modelVersion"] = json!("x");
        v["expectedFields"][0]["page"] = json!(2);
        assert!(validate(&v).is_ok());
    }

    #[test]
    fn partial_fragment_is_valid_so_far() {
        let v = json!({
            "hasSignature": true,
            "expectedFields": [{ "fieldName": "Signature Date", "present": false }]
        });
        match validate_partial(&v) {
            PartialStatus::ValidSoFar(p) => {
                assert_eq!(p.has_signature, Some(true));
                assert_eq!(p.field_count(), 1);
                assert_eq!(p.expected_fields[0].risk_level, None);
                assert!(p.page_integrity.is_none());
            }
            other => panic!("expected ValidSoFar, got {other:?}"),
        }
    }

    #[test]
    fn partial_fragment_with_bad_value_is_invalid() {
        let v = json!({ "expectedFields": [{ "riskLevel": 400 }] });
        assert!(matches!(
            validate_partial(&v),
            PartialStatus::Invalid(SchemaError::OutOfRange { .. })
        ));
    }

    #[test]
    fn partial_of_full_document_is_complete() {
        match validate_partial(&sample()) {
            PartialStatus::Complete(a) => assert_eq!(a, validate(&sample()).unwrap()),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_of_full_document_completes_to_itself() {
        let full = validate(&sample()).unwrap();
        let snapshot = PartialAnalysis::from(&full);
        assert_eq!(snapshot.field_count(), full.expected_fields.len());
        assert_eq!(snapshot.complete(), Some(full));
    }

    #[test]
    fn empty_arrays_count_as_present() {
        let v = json!({
            "hasSignature": false,
            "expectedFields": [],
            "pageIntegrity": { "isComplete": true, "totalPages": 0, "missingPages": [] }
        });
        assert!(matches!(validate_partial(&v), PartialStatus::Complete(_)));
        let v = json!({
            "hasSignature": false,
            "pageIntegrity": { "isComplete": true, "totalPages": 0, "missingPages": [] }
        });
        assert!(matches!(validate_partial(&v), PartialStatus::ValidSoFar(_)));
    }

    #[test]
    fn target_schema_names_every_required_key() {
        let s = target_schema();
        assert_eq!(s["required"], json!(["hasSignature", "expectedFields", "pageIntegrity"]));
        assert_eq!(
            s["properties"]["expectedFields"]["items"]["properties"]["riskLevel"]["maximum"],
            json!(100.0)
        );
    }
}
