//! Labeled vital-sign readings.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

/// Kind of vital sign captured from a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalKind {
    BloodPressure,
    HeartRate,
    Temperature,
    RespiratoryRate,
    OxygenSaturation,
    Weight,
    Height,
}

impl VitalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BloodPressure => "blood_pressure",
            Self::HeartRate => "heart_rate",
            Self::Temperature => "temperature",
            Self::RespiratoryRate => "respiratory_rate",
            Self::OxygenSaturation => "oxygen_saturation",
            Self::Weight => "weight",
            Self::Height => "height",
        }
    }
}

impl fmt::Display for VitalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric part of a reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VitalReading {
    Pressure { systolic: String, diastolic: String },
    Value { value: String },
}

/// One vital sign with the source text it was read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalRecord {
    #[serde(rename = "type")]
    pub kind: VitalKind,
    #[serde(flatten)]
    pub reading: VitalReading,
    pub text: String,
}

impl VitalRecord {
    /// Reading rendered for display, e.g. `120/80` or `98.6`.
    pub fn display_value(&self) -> String {
        match &self.reading {
            VitalReading::Pressure {
                systolic,
                diastolic,
            } => format!("{systolic}/{diastolic}"),
            VitalReading::Value { value } => value.clone(),
        }
    }
}

static VITAL_PATTERNS: Lazy<Vec<(VitalKind, Regex)>> = Lazy::new(|| {
    [
        (
            VitalKind::BloodPressure,
            r"(?i)(?:\bblood pressure|\bb\.p\.?|\bbp)\s*:?\s*(\d{2,3})\s*/\s*(\d{2,3})",
        ),
        (
            VitalKind::HeartRate,
            r"(?i)\b(?:heart rate|hr|pulse)\s*:?\s*(\d{2,3})\s*(?:bpm|beats)",
        ),
        (
            VitalKind::Temperature,
            r"(?i)\b(?:temperature|temp|t)\s*:?\s*(\d{2,3}(?:\.\d)?)\s*(?:°\s*[fc]|fahrenheit|celsius|f\b|c\b)",
        ),
        (
            VitalKind::RespiratoryRate,
            r"(?i)\b(?:respiratory rate|resp|rr)\s*:?\s*(\d{1,2})\b",
        ),
        (
            VitalKind::OxygenSaturation,
            r"(?i)\b(?:oxygen saturation|o2 sat|spo2|sat)\s*:?\s*(\d{2,3})\s*%?",
        ),
        (
            VitalKind::Weight,
            r"(?i)\b(?:weight|wt)\s*:?\s*(\d{1,3}(?:\.\d)?)\s*(?:lbs|kg|pounds)\b",
        ),
        (
            VitalKind::Height,
            r#"(?i)\b(?:height|ht)\s*:?\s*(?:(\d{2,3})\s*(?:cm|inches)\b|(\d)\s*'\s*(?:(\d{1,2})\s*"?)?)"#,
        ),
    ]
    .into_iter()
    .map(|(kind, p)| (kind, Regex::new(p).expect("valid vitals regex")))
    .collect()
});

/// Every labeled vital reading, grouped by kind in a fixed order.
pub fn extract_vitals(text: &str) -> Vec<VitalRecord> {
    let mut vitals = Vec::new();
    for (kind, pattern) in VITAL_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let reading = match kind {
                VitalKind::BloodPressure => VitalReading::Pressure {
                    systolic: caps[1].to_string(),
                    diastolic: caps[2].to_string(),
                },
                VitalKind::Height => VitalReading::Value {
                    value: height_value(&caps),
                },
                _ => VitalReading::Value {
                    value: caps[1].to_string(),
                },
            };
            vitals.push(VitalRecord {
                kind: *kind,
                reading,
                text: caps[0].trim().to_string(),
            });
        }
    }
    vitals
}

fn height_value(caps: &Captures<'_>) -> String {
    if let Some(metric) = caps.get(1) {
        return metric.as_str().to_string();
    }
    let feet = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    match caps.get(3) {
        Some(inches) => format!("{feet}'{}\"", inches.as_str()),
        None => format!("{feet}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_common_vitals() {
        let vitals = extract_vitals(
            "BP: 142/90, HR 88 bpm, Temp 98.6 F, RR 18, SpO2 97%, Weight 82 kg, Height: 5'10\"",
        );
        let kinds: Vec<_> = vitals.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VitalKind::BloodPressure,
                VitalKind::HeartRate,
                VitalKind::Temperature,
                VitalKind::RespiratoryRate,
                VitalKind::OxygenSaturation,
                VitalKind::Weight,
                VitalKind::Height,
            ]
        );
        assert_eq!(vitals[0].display_value(), "142/90");
        assert_eq!(vitals[2].display_value(), "98.6");
        assert_eq!(vitals[6].display_value(), "5'10\"");
    }

    #[test]
    fn metric_height() {
        let vitals = extract_vitals("Height 178 cm");
        assert_eq!(vitals.len(), 1);
        assert_eq!(vitals[0].display_value(), "178");
    }
}
