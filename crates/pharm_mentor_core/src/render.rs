//! crates/pharm_mentor_core/src/render.rs
//!
//! Renders a `StudyNotes` document as a printable HTML fragment. Sections
//! follow the order of an exam answer; optional sections that the document
//! does not carry are left out entirely.

use crate::domain::{StudyNotes, Subject};
use crate::format::escape_html;
use std::fmt::Write;

fn open_section(out: &mut String, id: &str, title: &str) {
    let _ = write!(out, r#"<section class="notes-section" id="{id}"><h2>{title}</h2>"#);
}

fn close_section(out: &mut String) {
    out.push_str("</section>");
}

fn paragraph(out: &mut String, text: &str) {
    let _ = write!(out, "<p>{}</p>", escape_html(text));
}

fn list(out: &mut String, tag: &str, items: &[String]) {
    let _ = write!(out, "<{tag}>");
    for item in items {
        let _ = write!(out, "<li>{}</li>", escape_html(item));
    }
    let _ = write!(out, "</{tag}>");
}

/// Renders the notes for `topic` in `subject`.
///
/// Output depends only on the arguments, so rendering the same document twice
/// yields identical HTML.
pub fn render_notes_html(notes: &StudyNotes, subject: Subject, topic: &str) -> String {
    let mut out = String::new();

    let _ = write!(
        out,
        r#"<article class="study-notes"><header><span class="subject">{}</span><h1>{}</h1><p>Comprehensive Exam-Oriented Academic Notes</p></header>"#,
        escape_html(subject.label()),
        escape_html(topic.trim())
    );

    open_section(&mut out, "introduction", "1. Introduction");
    paragraph(&mut out, &notes.introduction);
    close_section(&mut out);

    if let Some(definition) = &notes.definition {
        open_section(&mut out, "definition", "2. Definition");
        let _ = write!(out, "<blockquote>{}</blockquote>", escape_html(definition));
        close_section(&mut out);
    }

    if let Some(classification) = notes.classification.as_ref().filter(|c| !c.is_empty()) {
        open_section(&mut out, "classification", "3. Classification / Types");
        out.push_str("<dl>");
        for entry in classification {
            let _ = write!(
                out,
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(&entry.kind),
                escape_html(&entry.explanation)
            );
        }
        out.push_str("</dl>");
        close_section(&mut out);
    }

    open_section(&mut out, "detailed-explanation", "4. Detailed Explanation");
    list(&mut out, "ul", &notes.detailed_explanation);
    close_section(&mut out);

    open_section(&mut out, "examples", "5. Pharmacy Examples");
    list(&mut out, "ul", &notes.examples);
    close_section(&mut out);

    if let Some(diagram) = &notes.diagram_description {
        open_section(&mut out, "diagram", "6. Diagram Description");
        let _ = write!(
            out,
            "<h4>Schematic Visualization:</h4><pre>{}</pre>",
            escape_html(diagram)
        );
        close_section(&mut out);
    }

    if let Some(clinical) = &notes.clinical_correlation {
        open_section(&mut out, "clinical-correlation", "7. Clinical/Practical Correlation");
        paragraph(&mut out, clinical);
        close_section(&mut out);
    }

    open_section(&mut out, "exam-points", "8. Exam Focus Points");
    out.push_str("<ul>");
    for point in &notes.exam_points {
        let _ = write!(out, "<li><p>{}</p>", escape_html(&point.point));
        if let Some(mnemonic) = &point.mnemonic {
            let _ = write!(
                out,
                r#"<p class="mnemonic"><strong>Mnemonic:</strong> {}</p>"#,
                escape_html(mnemonic)
            );
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    close_section(&mut out);

    open_section(&mut out, "short-answers", "Short Answer (2-5 Marks)");
    list(&mut out, "ol", &notes.short_answer_questions);
    close_section(&mut out);

    open_section(&mut out, "long-answers", "Long Answer (5-10 Marks)");
    list(&mut out, "ol", &notes.long_answer_questions);
    close_section(&mut out);

    open_section(&mut out, "pyqs", "Previous Year Style Questions (PYQs)");
    list(&mut out, "ul", &notes.pyqs);
    close_section(&mut out);

    open_section(&mut out, "viva", "Viva Voce Practice");
    list(&mut out, "ul", &notes.viva_questions);
    close_section(&mut out);

    out.push_str("</article>");
    out
}
