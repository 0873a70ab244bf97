//! Regex heuristics for medications and conditions.

use once_cell::sync::Lazy;
use regex::Regex;

static MEDICATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // suffix-bearing drug name with a milligram dose
        r"(?i)\b([a-z]+(?:in|ol|pril|statin|mycin|cillin))\s+\d+\s*mg\b",
        r"(?i)\b(?:take|taking|prescribed|on)\s+([a-z]+)\b",
        r"(?i)\b([a-z]{4,})\s+\d+(?:\.\d+)?\s*(?:mg|mcg|g|ml|units?)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid medication regex"))
    .collect()
});

static CONDITION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b([a-z]+(?:itis|osis|emia|pathy|trophy|plasia|galy|oma|cardia|pnea))\b",
        r"(?i)\b([a-z]+\s+(?:disease|syndrome|disorder|condition))\b",
        r"(?i)\b(type\s+\d+\s+diabetes(?:\s+mellitus)?)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid condition regex"))
    .collect()
});

const MEDICATION_NOISE: &[&str] = &["take", "taking", "with", "current", "continue"];

/// Medication names found by dosage, suffix and verb cues, in pattern order.
pub fn extract_medications(text: &str) -> Vec<String> {
    let mut medications = Vec::new();
    for pattern in MEDICATION_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let med = caps[1].trim();
            if med.chars().count() > 3 && !MEDICATION_NOISE.contains(&med.to_lowercase().as_str()) {
                medications.push(med.to_string());
            }
        }
    }
    medications
}

/// Condition names found by disease suffixes and syndrome phrasing.
pub fn extract_conditions(text: &str) -> Vec<String> {
    let mut conditions = Vec::new();
    for pattern in CONDITION_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let condition = caps[1].trim();
            if condition.chars().count() > 4 {
                conditions.push(condition.to_string());
            }
        }
    }
    conditions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medications_from_dose_and_verbs() {
        let meds = extract_medications("Taking Metformin 500 mg daily and lisinopril 10 mg.");
        assert!(meds.iter().any(|m| m == "Metformin"));
        assert!(meds.iter().any(|m| m == "lisinopril"));
        assert!(!meds.iter().any(|m| m.eq_ignore_ascii_case("taking")));
    }

    #[test]
    fn conditions_from_suffix_and_phrase() {
        let conditions =
            extract_conditions("History of Type 2 diabetes mellitus, gastritis and Crohn disease.");
        assert!(conditions.contains(&"Type 2 diabetes mellitus".to_string()));
        assert!(conditions.contains(&"gastritis".to_string()));
        assert!(conditions.contains(&"Crohn disease".to_string()));
    }
}
