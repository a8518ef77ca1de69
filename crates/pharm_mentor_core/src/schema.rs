//! crates/pharm_mentor_core/src/schema.rs
//!
//! The structured-output contract for notes requests: the JSON schema sent to
//! the generation service and the parser that turns its reply into `StudyNotes`.

use crate::domain::StudyNotes;
use crate::ports::{PortError, PortResult};
use serde_json::{json, Value};

pub const STUDY_NOTES_SCHEMA_NAME: &str = "study_notes";

fn text_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

/// JSON schema describing `StudyNotes`.
///
/// Every property is listed as required so the schema is valid in strict
/// mode; the optional sections are expressed as nullable instead.
pub fn study_notes_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "introduction": { "type": "string" },
            "definition": { "type": ["string", "null"] },
            "classification": {
                "type": ["array", "null"],
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "type": { "type": "string" },
                        "explanation": { "type": "string" }
                    },
                    "required": ["type", "explanation"]
                }
            },
            "detailedExplanation": text_list(),
            "examples": text_list(),
            "diagramDescription": { "type": ["string", "null"] },
            "examPoints": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "point": { "type": "string" },
                        "mnemonic": { "type": ["string", "null"] }
                    },
                    "required": ["point", "mnemonic"]
                }
            },
            "shortAnswerQuestions": text_list(),
            "longAnswerQuestions": text_list(),
            "pyqs": text_list(),
            "vivaQuestions": text_list(),
            "clinicalCorrelation": { "type": ["string", "null"] }
        },
        "required": [
            "introduction",
            "definition",
            "classification",
            "detailedExplanation",
            "examples",
            "diagramDescription",
            "examPoints",
            "shortAnswerQuestions",
            "longAnswerQuestions",
            "pyqs",
            "vivaQuestions",
            "clinicalCorrelation"
        ]
    })
}

/// Removes a surrounding markdown code fence (```json ... ```), if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses a raw generation response into `StudyNotes`.
///
/// Missing required fields, wrong types or a blank introduction are reported
/// as `PortError::MalformedResponse`; no partial document is ever returned.
pub fn parse_study_notes(raw: &str) -> PortResult<StudyNotes> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(PortError::MalformedResponse(
            "the notes response was empty".to_string(),
        ));
    }

    let mut notes: StudyNotes = serde_json::from_str(body)
        .map_err(|e| PortError::MalformedResponse(format!("notes did not match the schema: {e}")))?;

    if notes.introduction.trim().is_empty() {
        return Err(PortError::MalformedResponse(
            "the notes response had an empty introduction".to_string(),
        ));
    }

    notes.definition = non_blank(notes.definition);
    notes.diagram_description = non_blank(notes.diagram_description);
    notes.clinical_correlation = non_blank(notes.clinical_correlation);
    for point in &mut notes.exam_points {
        point.mnemonic = non_blank(point.mnemonic.take());
    }

    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "introduction": "Powders are solid dosage forms.",
        "definition": "A powder is a mixture of finely divided drugs.",
        "classification": [{"type": "Bulk powders", "explanation": "Dispensed in bulk."}],
        "detailedExplanation": ["Particle size matters."],
        "examples": ["ORS"],
        "diagramDescription": null,
        "examPoints": [{"point": "Define powders", "mnemonic": ""}, {"point": "Types", "mnemonic": "BD"}],
        "shortAnswerQuestions": ["Define powders."],
        "longAnswerQuestions": ["Classify powders."],
        "pyqs": ["Write a note on effervescent granules."],
        "vivaQuestions": ["What is trituration?"],
        "clinicalCorrelation": "  "
    }"#;

    #[test]
    fn parses_a_conforming_response() {
        let notes = parse_study_notes(FULL).unwrap();
        assert_eq!(notes.examples, vec!["ORS".to_string()]);
        assert_eq!(notes.classification.as_ref().map(Vec::len), Some(1));
        assert_eq!(notes.diagram_description, None);
        assert_eq!(notes.clinical_correlation, None);
        assert_eq!(notes.exam_points[0].mnemonic, None);
        assert_eq!(notes.exam_points[1].mnemonic.as_deref(), Some("BD"));
    }

    #[test]
    fn accepts_fenced_json() {
        let fenced = format!("```json\n{FULL}\n```");
        assert!(parse_study_notes(&fenced).is_ok());
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let minimal = r#"{
            "introduction": "Intro",
            "detailedExplanation": [],
            "examples": [],
            "examPoints": [],
            "shortAnswerQuestions": [],
            "longAnswerQuestions": [],
            "pyqs": [],
            "vivaQuestions": []
        }"#;
        let notes = parse_study_notes(minimal).unwrap();
        assert!(notes.definition.is_none());
        assert!(notes.classification.is_none());
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let broken = r#"{"introduction": "Intro", "examples": []}"#;
        assert!(matches!(
            parse_study_notes(broken),
            Err(PortError::MalformedResponse(_))
        ));
    }

    #[test]
    fn non_json_and_empty_bodies_are_malformed() {
        assert!(matches!(
            parse_study_notes("Sorry, I cannot help."),
            Err(PortError::MalformedResponse(_))
        ));
        assert!(matches!(parse_study_notes("  "), Err(PortError::MalformedResponse(_))));
    }

    #[test]
    fn schema_requires_every_declared_property() {
        let schema = study_notes_schema();
        let declared = schema["properties"].as_object().unwrap().len();
        let required = schema["required"].as_array().unwrap().len();
        assert_eq!(declared, required);
    }
}
