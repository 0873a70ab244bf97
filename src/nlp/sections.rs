//! Header-scoped note sections (`Medications:`, `PMH:`, `Plan:` ...).

use once_cell::sync::Lazy;
use regex::Regex;

use super::entities::Category;

/// A line that opens a new section, e.g. `Review of systems:`.
static HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*[A-Za-z][A-Za-z0-9 &/()'-]{0,48}:").expect("valid header regex")
});

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*+•]|\d+[.)])\s*").expect("valid list marker regex"));

static MEDICATION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:current medications?|medications?|meds)\s*:").expect("valid regex")
});

static HISTORY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:past medical history|medical history|pmh)\s*:").expect("valid regex")
});

static NOTE_HEADERS: Lazy<Vec<(Category, Regex)>> = Lazy::new(|| {
    [
        (Category::ChiefComplaint, r"(?i)\b(?:chief complaint|cc)\s*:"),
        (
            Category::HistoryOfPresentIllness,
            r"(?i)\b(?:history of present illness|hpi)\s*:",
        ),
        (Category::ReviewOfSystems, r"(?i)\b(?:review of systems|ros)\s*:"),
        (
            Category::PhysicalExam,
            r"(?i)\b(?:physical examination|physical exam|examination|pe)\s*:",
        ),
        (
            Category::AssessmentAndPlan,
            r"(?i)(?:\bassessment and plan|\bassessment & plan|\ba&p|\bplan)\s*:",
        ),
    ]
    .into_iter()
    .map(|(category, p)| (category, Regex::new(p).expect("valid section regex")))
    .collect()
});

/// Bodies following every match of `header`, each running up to the next
/// header line or the end of the note.
fn section_bodies<'a>(text: &'a str, header: &Regex) -> Vec<&'a str> {
    header
        .find_iter(text)
        .map(|found| {
            let rest = &text[found.end()..];
            let end = match rest.find('\n') {
                Some(newline) => HEADER_LINE
                    .find(&rest[newline + 1..])
                    .map(|next| newline + 1 + next.start())
                    .unwrap_or(rest.len()),
                None => rest.len(),
            };
            &rest[..end]
        })
        .collect()
}

/// Bodies of medication sections.
pub fn medication_sections(text: &str) -> Vec<&str> {
    section_bodies(text, &MEDICATION_HEADER)
}

/// Bodies of past-medical-history sections.
pub fn history_sections(text: &str) -> Vec<&str> {
    section_bodies(text, &HISTORY_HEADER)
}

/// Trimmed, non-empty bodies of the standard note sections.
pub fn note_sections(text: &str) -> Vec<(Category, String)> {
    let mut out = Vec::new();
    for (category, header) in NOTE_HEADERS.iter() {
        for body in section_bodies(text, header) {
            let body = body.trim();
            if !body.is_empty() {
                out.push((*category, body.to_string()));
            }
        }
    }
    out
}

/// Individual list entries of a section body with list markers removed.
pub fn section_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(|line| LIST_MARKER.replace(line.trim(), "").trim().to_string())
        .filter(|line| line.chars().count() > 3)
        .collect()
}
