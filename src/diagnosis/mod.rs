//! Diagnostic suggestions from a hosted language model.

pub mod client;
pub mod parse;

use std::sync::Arc;

use tracing::{info, instrument, warn};

pub use client::{CompletionBackend, DiagnosisError, OpenRouterClient};
pub use parse::{parse_diagnosis_response, DiagnosisResult};

/// Prefix of every reply produced when the upstream call fails.
pub const SERVICE_ERROR_PREFIX: &str = "Diagnosis service error:";

/// Fill the fixed diagnostic prompt with the extracted fields.
pub fn build_prompt(symptoms: &str, conditions: &str, medications: &str) -> String {
    format!(
        r#"
Context:
The following patient data has been extracted:
- Symptoms: {symptoms}
- Previous Conditions: {conditions}
- Medications: {medications}

Based on this, generate a concise diagnostic summary.

Your task:
1. List the most likely diagnosis (or differential diagnoses if unclear)
2. Briefly explain reasoning based on symptoms and history
3. Indicate urgency (e.g., emergency, urgent care, routine)
4. Suggest next clinical steps (e.g., tests, referrals, treatment)

Tone: Keep it professional, brief, and free of generic AI language. Prioritize clarity over verbosity.

Output Format Example:

---
Likely Diagnosis: [Condition Name]  
Reasoning: [Short rationale]  
Urgency: [Emergency/Urgent/Routine]  
Next Steps: [Relevant tests/treatments/referrals]
---
"#
    )
}

/// Models return escaped newlines now and then.
fn tidy_reply(reply: &str) -> String {
    reply.trim().replace("\\n", "\n")
}

/// Prompt formatting plus the upstream call, never failing outward.
#[derive(Clone)]
pub struct DiagnosisService {
    backend: Arc<dyn CompletionBackend>,
}

impl DiagnosisService {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Reply text, or `Diagnosis service error: ...` when the call fails.
    #[instrument(skip_all)]
    pub async fn suggest(&self, symptoms: &str, conditions: &str, medications: &str) -> String {
        let prompt = build_prompt(symptoms, conditions, medications);
        match self.backend.complete(&prompt).await {
            Ok(reply) => {
                info!(chars = reply.len(), "diagnosis received");
                tidy_reply(&reply)
            }
            Err(err) => {
                warn!(error = %err, "diagnosis request failed");
                format!("{SERVICE_ERROR_PREFIX} {err}")
            }
        }
    }

    /// Reply text together with its parsed fields.
    pub async fn suggest_parsed(
        &self,
        symptoms: &str,
        conditions: &str,
        medications: &str,
    ) -> (String, DiagnosisResult) {
        let reply = self.suggest(symptoms, conditions, medications).await;
        let parsed = parse_diagnosis_response(&reply);
        (reply, parsed)
    }
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;

    use super::*;

    struct Echo;

    impl CompletionBackend for Echo {
        fn complete<'a>(
            &'a self,
            prompt: &'a str,
        ) -> BoxFuture<'a, Result<String, DiagnosisError>> {
            Box::pin(async move { Ok(format!("  {}\\nUrgency: Routine  ", prompt.len())) })
        }
    }

    #[test]
    fn prompt_carries_fields() {
        let prompt = build_prompt("cough", "asthma", "albuterol");
        assert!(prompt.contains("- Symptoms: cough"));
        assert!(prompt.contains("- Previous Conditions: asthma"));
        assert!(prompt.contains("- Medications: albuterol"));
        assert!(prompt.contains("Next Steps: [Relevant tests/treatments/referrals]"));
    }

    #[test]
    fn format_example_separates_fields_with_two_spaces() {
        let prompt = build_prompt("cough", "asthma", "albuterol");
        assert!(prompt.contains("Likely Diagnosis: [Condition Name]  \nReasoning:"));
        assert!(prompt.contains("Reasoning: [Short rationale]  \nUrgency:"));
        assert!(prompt.contains("Urgency: [Emergency/Urgent/Routine]  \nNext Steps:"));
    }

    #[tokio::test]
    async fn reply_is_trimmed_and_unescaped() {
        let service = DiagnosisService::new(Arc::new(Echo));
        let reply = service.suggest("a", "b", "c").await;
        assert!(reply.ends_with("\nUrgency: Routine"));
        assert!(!reply.starts_with(' '));
    }

    #[tokio::test]
    async fn missing_key_becomes_error_text() {
        let settings = crate::config::Settings::default();
        let client = OpenRouterClient::from_settings(&settings).unwrap();
        let service = DiagnosisService::new(Arc::new(client));
        let reply = service.suggest("a", "b", "c").await;
        assert_eq!(
            reply,
            "Diagnosis service error: OPENROUTER_API_KEY is not set"
        );
    }
}
