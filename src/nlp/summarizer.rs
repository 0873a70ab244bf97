//! Extractive summarization: rank sentences by similarity to the whole note.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::embeddings::{cosine, SentenceEncoder};

pub const DEFAULT_SUMMARY_SENTENCES: usize = 3;

pub const EMPTY_NOTE_SUMMARY: &str = "Summary not available - insufficient clinical content.";

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"));

/// Split text after terminal punctuation followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;
    for found in SENTENCE_BREAK.find_iter(text) {
        // keep the punctuation mark with its sentence
        let cut = found.start() + 1;
        sentences.push(&text[start..cut]);
        start = found.end();
    }
    sentences.push(&text[start..]);
    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep the `num_sentences` sentences closest to the document embedding,
/// in their original order.
pub fn summarize_note(encoder: &dyn SentenceEncoder, text: &str, num_sentences: usize) -> String {
    if text.trim().is_empty() {
        return EMPTY_NOTE_SUMMARY.to_string();
    }
    let sentences = split_sentences(text);
    if sentences.len() <= num_sentences {
        return sentences.join(" ");
    }

    let mut inputs: Vec<&str> = sentences.iter().map(String::as_str).collect();
    inputs.push(text);
    let mut embeddings = match encoder.encode(&inputs) {
        Ok(embeddings) if embeddings.len() == inputs.len() => embeddings,
        Ok(embeddings) => {
            warn!(
                expected = inputs.len(),
                got = embeddings.len(),
                "encoder returned wrong count; using leading sentences"
            );
            return sentences[..num_sentences].join(" ");
        }
        Err(err) => {
            warn!(error = %err, "sentence encoding failed; using leading sentences");
            return sentences[..num_sentences].join(" ");
        }
    };
    let document = embeddings.pop().unwrap_or_default();

    let top = top_indices(&embeddings, &document, num_sentences);
    debug!(sentences = sentences.len(), selected = ?top, "ranked sentences");
    top.into_iter()
        .map(|idx| sentences[idx].as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Indices of the `k` most similar vectors, ascending.
fn top_indices(vectors: &[Vec<f32>], target: &[f32], k: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(idx, vector)| (idx, cosine(vector, target)))
        .collect();
    // stable sort, so equal scores keep the earlier sentence first
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    let mut top: Vec<usize> = scored.into_iter().take(k).map(|(idx, _)| idx).collect();
    top.sort_unstable();
    top
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("Fever since Monday. Any cough? Yes!\nNo rash.");
        assert_eq!(
            sentences,
            vec!["Fever since Monday.", "Any cough?", "Yes!", "No rash."]
        );
    }

    #[test]
    fn keeps_decimal_values_intact() {
        let sentences = split_sentences("Temp 38.5 recorded. Stable.");
        assert_eq!(sentences, vec!["Temp 38.5 recorded.", "Stable."]);
    }

    #[test]
    fn top_indices_restore_order() {
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.9, 0.1]];
        assert_eq!(top_indices(&vectors, &[1.0, 0.0], 2), vec![1, 2]);
    }
}
