//! Natural language processing orchestration layer.

pub mod embeddings;
pub mod entities;
pub mod ner;
pub mod patterns;
pub mod sections;
pub mod summarizer;
pub mod vitals;

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::Settings;

use self::{
    embeddings::SentenceEncoder,
    entities::{Category, StructuredNote},
    ner::Ner,
};

/// Summary and structured entities for one note.
#[derive(Debug, Clone, Serialize)]
pub struct NoteAnalysis {
    pub summary: String,
    pub structured: StructuredNote,
}

impl NoteAnalysis {
    /// Symptoms, conditions and medications formatted for the diagnosis prompt.
    pub fn diagnosis_fields(&self) -> (String, String, String) {
        let entities = &self.structured.entities;
        (
            entities.joined(Category::Symptoms),
            entities.joined(Category::PastMedicalHistory),
            entities.joined(Category::Medications),
        )
    }
}

/// Loaded models shared read-only across requests.
#[derive(Clone)]
pub struct NoteAnalyzer {
    ner: Arc<dyn Ner>,
    encoder: Arc<dyn SentenceEncoder>,
    summary_sentences: usize,
}

impl NoteAnalyzer {
    pub fn new(
        ner: Arc<dyn Ner>,
        encoder: Arc<dyn SentenceEncoder>,
        summary_sentences: usize,
    ) -> Self {
        Self {
            ner,
            encoder,
            summary_sentences,
        }
    }

    /// Load the configured NER model and sentence encoder.
    pub async fn load(settings: &Settings) -> Result<Self> {
        let ner = ner::load_model(settings).await?;
        let encoder = embeddings::load_encoder().await?;
        info!(summary_sentences = settings.summary_sentences, "note analyzer ready");
        Ok(Self::new(ner, encoder, settings.summary_sentences))
    }

    pub fn with_summary_sentences(mut self, summary_sentences: usize) -> Self {
        self.summary_sentences = summary_sentences;
        self
    }

    /// Summarize the cleaned note and extract from the uploaded text, so span
    /// offsets index the caller's bytes. CPU bound; run off the async workers.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn analyze(&self, text: &str) -> NoteAnalysis {
        let cleaned = clean_note(text);
        let summary =
            summarizer::summarize_note(self.encoder.as_ref(), &cleaned, self.summary_sentences);
        let structured = entities::extract_entities(self.ner.as_ref(), text);
        NoteAnalysis {
            summary,
            structured,
        }
    }
}

static INLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Normalise line endings, drop control characters and collapse runs of
/// spaces and blank lines.
pub fn clean_note(text: &str) -> String {
    let normalised: String = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect();
    let collapsed = INLINE_SPACE.replace_all(&normalised, " ");
    let lines: Vec<&str> = collapsed.lines().map(str::trim).collect();
    BLANK_LINES
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_note_normalises_whitespace() {
        let cleaned = clean_note("  BP:\t120/80 \r\n\r\n\r\n\r\nHR  72 bpm\u{0007}  ");
        assert_eq!(cleaned, "BP: 120/80\n\nHR 72 bpm");
    }
}
