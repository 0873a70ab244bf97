//! Entity categories and the combined NER + pattern extraction pass.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, warn};

use super::{
    ner::{Ner, Span},
    patterns, sections,
    vitals::{self, VitalRecord},
};

/// Items that carry no clinical meaning on their own.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "mg", "ml", "daily", "twice", "current", "pain", "obtain",
];

/// Category of extracted strings, serialized by its snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PastMedicalHistory,
    Medications,
    Vitals,
    Symptoms,
    Plan,
    ChiefComplaint,
    HistoryOfPresentIllness,
    ReviewOfSystems,
    PhysicalExam,
    AssessmentAndPlan,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::PastMedicalHistory,
        Category::Medications,
        Category::Vitals,
        Category::Symptoms,
        Category::Plan,
        Category::ChiefComplaint,
        Category::HistoryOfPresentIllness,
        Category::ReviewOfSystems,
        Category::PhysicalExam,
        Category::AssessmentAndPlan,
    ];

    /// Human readable heading.
    pub fn title(&self) -> &'static str {
        match self {
            Self::PastMedicalHistory => "Past medical history",
            Self::Medications => "Medications",
            Self::Vitals => "Vitals",
            Self::Symptoms => "Symptoms",
            Self::Plan => "Plan",
            Self::ChiefComplaint => "Chief complaint",
            Self::HistoryOfPresentIllness => "History of present illness",
            Self::ReviewOfSystems => "Review of systems",
            Self::PhysicalExam => "Physical exam",
            Self::AssessmentAndPlan => "Assessment and plan",
        }
    }

    /// Category an NER label feeds, if any.
    fn from_span(span: &Span) -> Option<Self> {
        match span.label.as_str() {
            "CHEMICAL" | "DRUG" => Some(Self::Medications),
            "DISEASE" | "DISORDER" | "INJURY_OR_POISONING" => Some(Self::PastMedicalHistory),
            "SIGN_OR_SYMPTOM" => Some(Self::Symptoms),
            "SYMPTOM" if !span.negated => Some(Self::Symptoms),
            "VITALS" => Some(Self::Vitals),
            _ => None,
        }
    }
}

/// Ordered, deduplicated strings per category.
///
/// Every category is present from construction so the serialized object
/// always carries the full key set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EntityBag {
    entries: IndexMap<Category, IndexSet<String>>,
}

impl Default for EntityBag {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityBag {
    pub fn new() -> Self {
        let entries = Category::ALL
            .iter()
            .map(|category| (*category, IndexSet::new()))
            .collect();
        Self { entries }
    }

    /// Add one item after trimming; returns false when it was filtered
    /// out or already present.
    pub fn push(&mut self, category: Category, item: impl AsRef<str>) -> bool {
        let item = item.as_ref().trim();
        if !is_meaningful(item) {
            return false;
        }
        self.entries
            .entry(category)
            .or_default()
            .insert(item.to_string())
    }

    pub fn extend<I, S>(&mut self, category: Category, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            self.push(category, item);
        }
    }

    /// Items of a category in first-seen order.
    pub fn get(&self, category: Category) -> Vec<&str> {
        self.entries
            .get(&category)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &IndexSet<String>)> {
        self.entries.iter().map(|(category, items)| (*category, items))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|items| items.is_empty())
    }

    /// Category items joined for a prompt, or `None documented`.
    pub fn joined(&self, category: Category) -> String {
        let items = self.get(category);
        if items.is_empty() {
            "None documented".to_string()
        } else {
            items.join(", ")
        }
    }
}

fn is_meaningful(item: &str) -> bool {
    item.chars().count() > 2
        && !STOP_WORDS.contains(&item.to_lowercase().as_str())
        && !item.starts_with('-')
        && !item.starts_with('•')
        && !item.chars().all(|c| c.is_ascii_digit())
}

/// Structured payload returned alongside a summary.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredNote {
    #[serde(flatten)]
    pub entities: EntityBag,
    pub vitals_with_values: Vec<VitalRecord>,
    pub all_entities: Vec<Span>,
}

/// Run the NER model and every pattern pass over `text`.
///
/// A failing model is logged and skipped; pattern results are always
/// produced.
pub fn extract_entities(ner: &dyn Ner, text: &str) -> StructuredNote {
    let mut bag = EntityBag::new();

    // Spans index the raw text; rule-based passes read the cleaned copy.
    let spans = match ner.extract(text) {
        Ok(spans) => spans,
        Err(err) => {
            warn!(error = %err, "ner failed; continuing with patterns only");
            Vec::new()
        }
    };
    for span in &spans {
        if let Some(category) = Category::from_span(span) {
            bag.push(category, &span.text);
        }
    }

    let text = super::clean_note(text);
    let text = text.as_str();
    bag.extend(Category::Medications, patterns::extract_medications(text));
    bag.extend(Category::PastMedicalHistory, patterns::extract_conditions(text));
    let vitals_with_values = vitals::extract_vitals(text);

    for body in sections::medication_sections(text) {
        bag.extend(Category::Medications, patterns::extract_medications(body));
        bag.extend(Category::Medications, sections::section_lines(body));
    }
    for body in sections::history_sections(text) {
        bag.extend(Category::PastMedicalHistory, patterns::extract_conditions(body));
        bag.extend(Category::PastMedicalHistory, sections::section_lines(body));
    }

    for (category, body) in sections::note_sections(text) {
        if category == Category::AssessmentAndPlan {
            bag.extend(Category::Plan, sections::section_lines(&body));
        }
        bag.push(category, body);
    }

    debug!(
        spans = spans.len(),
        vitals = vitals_with_values.len(),
        "extracted entities"
    );
    StructuredNote {
        entities: bag,
        vitals_with_values,
        all_entities: spans,
    }
}
