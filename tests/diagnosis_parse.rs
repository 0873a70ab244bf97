use note_assistant::diagnosis::{parse_diagnosis_response, DiagnosisResult};

const SAMPLE: &str = "**Likely Diagnosis:** Asthma exacerbation  \n**Reasoning:** The patient's symptoms of shortness of breath, wheezing, and persistent dry cough, combined with a history of asthma and seasonal allergies, suggest an asthma flare-up.  \n**Urgency:** Urgent care  \n**Next Steps:** Assess peak flow and spirometry, review and adjust asthma action plan, consider adding an inhaled corticosteroid.";

#[test]
fn reads_all_four_fields() {
    let parsed = parse_diagnosis_response(SAMPLE);
    assert_eq!(parsed.likely_diagnosis, "Asthma exacerbation");
    assert!(parsed.reasoning.starts_with("The patient's symptoms"));
    assert!(parsed.reasoning.ends_with("asthma flare-up."));
    assert_eq!(parsed.urgency, "Urgent care");
    assert!(parsed.next_steps.ends_with("inhaled corticosteroid."));
}

#[test]
fn labels_are_case_insensitive_and_line_delimited() {
    let parsed = parse_diagnosis_response(
        "---\nlikely diagnosis: Migraine\nreasoning: Unilateral throbbing headache\nURGENCY: Routine\n---",
    );
    assert_eq!(parsed.likely_diagnosis, "Migraine");
    assert_eq!(parsed.reasoning, "Unilateral throbbing headache");
    assert_eq!(parsed.urgency, "Routine");
    assert_eq!(parsed.next_steps, "");
}

#[test]
fn missing_labels_default_to_empty() {
    let parsed = parse_diagnosis_response("Diagnosis service error: connection refused");
    assert_eq!(parsed, DiagnosisResult::default());
    assert!(parsed.is_empty());
}
