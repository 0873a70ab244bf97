//! Labeled-field parsing of free-text diagnostic replies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fields read from a model reply; empty when the label is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub likely_diagnosis: String,
    pub reasoning: String,
    pub urgency: String,
    pub next_steps: String,
}

impl DiagnosisResult {
    pub fn is_empty(&self) -> bool {
        self.likely_diagnosis.is_empty()
            && self.reasoning.is_empty()
            && self.urgency.is_empty()
            && self.next_steps.is_empty()
    }
}

fn field_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"(?is){label}:\s*(.+?)(?:\s{{2,}}|\n|$)")).expect("valid field regex")
}

static LIKELY_DIAGNOSIS: Lazy<Regex> = Lazy::new(|| field_pattern("Likely Diagnosis"));
static REASONING: Lazy<Regex> = Lazy::new(|| field_pattern("Reasoning"));
static URGENCY: Lazy<Regex> = Lazy::new(|| field_pattern("Urgency"));
static NEXT_STEPS: Lazy<Regex> = Lazy::new(|| field_pattern("Next Steps"));

fn capture(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Read the four labeled fields. The reply format is not validated.
pub fn parse_diagnosis_response(response: &str) -> DiagnosisResult {
    let text = response.replace("**", "");
    DiagnosisResult {
        likely_diagnosis: capture(&LIKELY_DIAGNOSIS, &text),
        reasoning: capture(&REASONING, &text),
        urgency: capture(&URGENCY, &text),
        next_steps: capture(&NEXT_STEPS, &text),
    }
}
