//! crates/pharm_mentor_core/src/prompt.rs
//!
//! Builds the natural-language instruction sent with every notes request.

use crate::domain::Preferences;

pub const NOTES_SYSTEM_INSTRUCTIONS: &str = r#"You are PharmMentor, an expert B.Pharm lecturer who writes exam-oriented study notes aligned with the Pharmacy Council of India (PCI) syllabus.

Rules:
- Write in simple, precise academic English that a first-year student can revise from.
- Prefer short points over long paragraphs.
- Use pharmacy-relevant examples (drugs, dosage forms, official compounds, instruments).
- Questions must read like real university exam questions.
- Respond ONLY with JSON that matches the requested schema. Do not wrap it in prose."#;

/// Composes the instruction for one notes request.
///
/// Every preference is embedded; each toggle becomes an explicit include or
/// omit directive for its optional section.
pub fn build_notes_instruction(preferences: &Preferences) -> String {
    let university = match preferences.university() {
        Some(name) => format!("{name} (follow its question paper pattern)"),
        None => "Any university following the PCI syllabus".to_string(),
    };

    let diagrams = if preferences.include_diagrams {
        "diagramDescription: describe a labelled diagram the student should draw, part by part."
    } else {
        "diagramDescription: OMIT this field; the student did not ask for diagrams."
    };
    let mnemonics = if preferences.include_mnemonics {
        "Add a short, memorable mnemonic to the points where one genuinely helps."
    } else {
        "Do not include mnemonics."
    };
    let clinical = if preferences.include_clinical_correlation {
        "clinicalCorrelation: relate the topic to clinical or practical pharmacy."
    } else {
        "clinicalCorrelation: OMIT this field; the student did not ask for clinical correlation."
    };

    // A single pass, so user text containing braces is embedded verbatim.
    format!(
        r#"Prepare study notes on the following topic.

SUBJECT: {subject}
TOPIC: {topic}
SEMESTER: {semester}
UNIVERSITY PATTERN: {university}
DEPTH: {depth}
{depth_guidance}

Sections to produce:
- introduction: a short orientation to the topic.
- definition: the standard textbook definition, if the topic has one.
- classification: types or categories with a one-line explanation each, if applicable.
- detailedExplanation: the core content as ordered points.
- examples: pharmacy-specific examples.
- {diagrams}
- examPoints: the points examiners look for. {mnemonics}
- shortAnswerQuestions: likely 2-5 mark questions.
- longAnswerQuestions: likely 5-10 mark questions.
- pyqs: previous-year style questions in the university's pattern.
- vivaQuestions: short oral-exam questions.
- {clinical}"#,
        subject = preferences.subject.label(),
        topic = preferences.topic.trim(),
        semester = preferences.semester.trim(),
        university = university,
        depth = preferences.depth.label(),
        depth_guidance = preferences.depth.guidance(),
        diagrams = diagrams,
        mnemonics = mnemonics,
        clinical = clinical,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnswerDepth, Subject};

    fn prefs() -> Preferences {
        Preferences {
            subject: Subject::InorganicChemistry,
            topic: "  Limit Test for Iron ".to_string(),
            semester: "Semester 1".to_string(),
            university: Some("RGUHS".to_string()),
            depth: AnswerDepth::Detailed,
            include_diagrams: true,
            include_mnemonics: false,
            include_clinical_correlation: true,
        }
    }

    #[test]
    fn instruction_embeds_every_preference() {
        let text = build_notes_instruction(&prefs());
        assert!(text.contains("SUBJECT: Pharmaceutical Inorganic Chemistry"));
        assert!(text.contains("TOPIC: Limit Test for Iron\n"));
        assert!(text.contains("SEMESTER: Semester 1"));
        assert!(text.contains("RGUHS"));
        assert!(text.contains("DEPTH: Detailed Explanation"));
        assert!(text.contains("Do not include mnemonics."));
        assert!(text.contains("describe a labelled diagram"));
        assert!(text.contains("relate the topic to clinical"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn disabled_toggles_turn_into_omit_directives() {
        let mut p = prefs();
        p.include_diagrams = false;
        p.include_clinical_correlation = false;
        p.university = Some("  ".to_string());
        let text = build_notes_instruction(&p);
        assert!(text.contains("diagramDescription: OMIT"));
        assert!(text.contains("clinicalCorrelation: OMIT"));
        assert!(text.contains("Any university following the PCI syllabus"));
    }

    #[test]
    fn braces_in_user_text_are_kept_verbatim() {
        let mut p = prefs();
        p.topic = "Buffers {university}".to_string();
        p.semester = "{depth}".to_string();
        let text = build_notes_instruction(&p);
        assert!(text.contains("TOPIC: Buffers {university}\n"));
        assert!(text.contains("SEMESTER: {depth}\n"));
        assert!(text.contains("UNIVERSITY PATTERN: RGUHS (follow its question paper pattern)"));
    }
}
