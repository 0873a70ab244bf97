//! Clinical NER models. A dictionary matcher is always available; an ONNX
//! token-classification model can be loaded with the `onx` feature.

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;

/// Extracted entity span with offsets relative to the source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
    /// Set when a negation cue precedes the span in the same sentence.
    pub negated: bool,
}

/// Trait for NER implementations.
pub trait Ner: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<Span>>;
}

const LEXICON: &[(&str, &[&str])] = &[
    (
        "SECTION_PMH",
        &["past medical history", "medical history", "pmh"],
    ),
    ("SECTION_MEDS", &["current medications", "medications", "meds"]),
    ("SECTION_VITALS", &["vital signs", "vitals"]),
    (
        "VITALS",
        &[
            "blood pressure",
            "heart rate",
            "temperature",
            "respiratory rate",
            "oxygen saturation",
        ],
    ),
    (
        "SYMPTOM",
        &["chest pain", "shortness of breath", "difficulty breathing"],
    ),
    (
        "SIGN_OR_SYMPTOM",
        &[
            "abdominal pain",
            "cough",
            "dizziness",
            "dyspnea",
            "fatigue",
            "fever",
            "headache",
            "nausea",
            "palpitations",
            "vomiting",
            "wheezing",
        ],
    ),
    (
        "DISEASE",
        &[
            "asthma",
            "atrial fibrillation",
            "copd",
            "coronary artery disease",
            "diabetes",
            "heart failure",
            "hyperlipidemia",
            "hypertension",
            "myocardial infarction",
            "pneumonia",
            "stroke",
        ],
    ),
    (
        "CHEMICAL",
        &[
            "albuterol",
            "amlodipine",
            "aspirin",
            "atorvastatin",
            "fluticasone",
            "insulin",
            "lisinopril",
            "metformin",
            "metoprolol",
            "nitroglycerin",
            "omeprazole",
            "warfarin",
        ],
    ),
];

const NEGATION_CUES: &[&str] = &["no", "denies", "denied", "without", "negative for", "not"];

static MATCHERS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    LEXICON
        .iter()
        .filter_map(|(label, terms)| {
            let mut sorted: Vec<&str> = terms.to_vec();
            sorted.sort_by_key(|term| std::cmp::Reverse(term.len()));
            let alternation = sorted
                .iter()
                .map(|term| regex::escape(term))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
                .ok()
                .map(|re| (*label, re))
        })
        .collect()
});

static NEGATION: Lazy<Regex> = Lazy::new(|| {
    let cues = NEGATION_CUES.join("|");
    Regex::new(&format!(r"(?i)\b(?:{cues})\b")).expect("valid negation regex")
});

/// Rule-based matcher over a small clinical lexicon.
pub struct DictionaryNer;

impl Ner for DictionaryNer {
    fn extract(&self, text: &str) -> Result<Vec<Span>> {
        let mut spans = Vec::new();
        for (label, matcher) in MATCHERS.iter() {
            for found in matcher.find_iter(text) {
                spans.push(Span {
                    text: found.as_str().to_string(),
                    label: (*label).to_string(),
                    start: found.start(),
                    end: found.end(),
                    score: 0.8,
                    negated: is_negated(text, found.start()),
                });
            }
        }
        Ok(resolve_overlaps(spans))
    }
}

/// Keep the longest span wherever matches overlap, ordered by position.
pub fn resolve_overlaps(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match kept.last_mut() {
            Some(last) if span.start < last.end => {
                if span.end - span.start > last.end - last.start {
                    *last = span;
                }
            }
            _ => kept.push(span),
        }
    }
    kept
}

/// Whether a negation cue appears between the sentence start and `offset`.
fn is_negated(text: &str, offset: usize) -> bool {
    let prefix = &text[..offset];
    let sentence_start = prefix
        .rfind(|c: char| matches!(c, '.' | '!' | '?' | '\n'))
        .map(|idx| idx + 1)
        .unwrap_or(0);
    NEGATION.is_match(&prefix[sentence_start..])
}

/// Load the configured NER model, falling back to the dictionary matcher.
pub async fn load_model(settings: &Settings) -> Result<Arc<dyn Ner>> {
    if let Some(dir) = &settings.ner_model_dir {
        #[cfg(feature = "onx")]
        {
            match onnx::OnnxNer::load(dir) {
                Ok(model) => {
                    info!(path = %dir.display(), "loaded onnx ner model");
                    return Ok(Arc::new(model) as Arc<dyn Ner>);
                }
                Err(err) => warn!(error = %err, "onnx ner unavailable; using dictionary"),
            }
        }
        #[cfg(not(feature = "onx"))]
        {
            warn!(path = %dir.display(), "NER_MODEL_DIR set but `onx` feature disabled");
        }
    }
    info!("using dictionary ner");
    Ok(Arc::new(DictionaryNer) as Arc<dyn Ner>)
}

#[cfg(feature = "onx")]
mod onnx {
    use std::{collections::BTreeMap, path::Path, sync::Arc};

    use anyhow::{anyhow, Context, Result};
    use ndarray::{Array2, CowArray};
    use ort::{
        tensor::OrtOwnedTensor, Environment, GraphOptimizationLevel, Session, SessionBuilder,
        Value,
    };
    use serde::Deserialize;
    use tokenizers::Tokenizer;

    use super::{is_negated, resolve_overlaps, Ner, Span};

    #[derive(Deserialize)]
    struct ModelConfig {
        id2label: BTreeMap<String, String>,
    }

    /// BIO token classifier exported to ONNX alongside `tokenizer.json`
    /// and a Hugging Face `config.json`.
    pub struct OnnxNer {
        session: Session,
        tokenizer: Tokenizer,
        labels: Vec<String>,
    }

    impl OnnxNer {
        pub fn load(dir: &Path) -> Result<Self> {
            let environment: Arc<Environment> = Environment::builder()
                .with_name("clinical-ner")
                .build()?
                .into_arc();
            let session = SessionBuilder::new(&environment)?
                .with_optimization_level(GraphOptimizationLevel::Level1)?
                .with_model_from_file(dir.join("model.onnx"))?;
            let tokenizer = Tokenizer::from_file(dir.join("tokenizer.json"))
                .map_err(|e| anyhow!("loading tokenizer: {e}"))?;
            let raw = std::fs::read_to_string(dir.join("config.json"))
                .context("reading model config.json")?;
            let config: ModelConfig = serde_json::from_str(&raw)?;
            let mut labels = vec![String::from("O"); config.id2label.len()];
            for (id, label) in config.id2label {
                let idx: usize = id.parse().context("id2label key")?;
                if idx < labels.len() {
                    labels[idx] = label;
                }
            }
            Ok(Self {
                session,
                tokenizer,
                labels,
            })
        }
    }

    impl Ner for OnnxNer {
        fn extract(&self, text: &str) -> Result<Vec<Span>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| anyhow!("tokenizing note: {e}"))?;
            let ids: Vec<i64> = encoding.get_ids().iter().map(|&v| v as i64).collect();
            let mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&v| v as i64)
                .collect();
            let len = ids.len();
            let input_ids = CowArray::from(Array2::from_shape_vec((1, len), ids)?.into_dyn());
            let attention = CowArray::from(Array2::from_shape_vec((1, len), mask)?.into_dyn());
            let inputs = vec![
                Value::from_array(self.session.allocator(), &input_ids)?,
                Value::from_array(self.session.allocator(), &attention)?,
            ];
            let outputs = self.session.run(inputs)?;
            let logits: OrtOwnedTensor<f32, _> = outputs[0].try_extract()?;
            let logits = logits.view();

            let mut spans: Vec<Span> = Vec::new();
            for (token_idx, &(start, end)) in encoding.get_offsets().iter().enumerate() {
                if start == end {
                    continue;
                }
                let row: Vec<f32> = (0..self.labels.len())
                    .map(|class| logits[[0, token_idx, class]])
                    .collect();
                let (best, score) = softmax_argmax(&row);
                let tag = self.labels[best].as_str();
                if tag == "O" {
                    continue;
                }
                let (prefix, entity) = tag.split_once('-').unwrap_or(("B", tag));
                match spans.last_mut() {
                    Some(last) if prefix == "I" && last.label == entity && start <= last.end + 1 => {
                        last.end = end;
                        last.text = text[last.start..end].to_string();
                        last.score = last.score.min(score);
                    }
                    _ => spans.push(Span {
                        text: text[start..end].to_string(),
                        label: entity.to_string(),
                        start,
                        end,
                        score,
                        negated: is_negated(text, start),
                    }),
                }
            }
            Ok(resolve_overlaps(spans))
        }
    }

    fn softmax_argmax(row: &[f32]) -> (usize, f64) {
        let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = row.iter().map(|v| (v - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        exps.iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(idx, v)| (idx, (*v / total) as f64))
            .unwrap_or((0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_longest_overlapping_term() {
        let spans = DictionaryNer
            .extract("Past medical history: hypertension.")
            .unwrap();
        let labels: Vec<_> = spans.iter().map(|s| (s.label.as_str(), s.text.as_str())).collect();
        assert_eq!(
            labels,
            vec![
                ("SECTION_PMH", "Past medical history"),
                ("DISEASE", "hypertension")
            ]
        );
    }

    #[test]
    fn negation_is_scoped_to_sentence() {
        let spans = DictionaryNer
            .extract("Patient denies chest pain. Reports shortness of breath.")
            .unwrap();
        let chest = spans.iter().find(|s| s.text == "chest pain").unwrap();
        let sob = spans.iter().find(|s| s.text == "shortness of breath").unwrap();
        assert!(chest.negated);
        assert!(!sob.negated);
    }
}
