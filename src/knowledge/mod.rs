//! Static disease knowledge base used by the PDF report.
//!
//! Records are authored by hand and compiled in. Lookups go through
//! [`DiseaseKey`], which applies the one normalisation rule the keys need.

mod catalog;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KnowledgeError {
    #[error("No disease data found for '{plant} - {condition}'")]
    NotFound { plant: String, condition: String },
}

/// Normalised `plant___condition` key.
///
/// Lowercased, whitespace runs collapsed to `_`, parts joined with `___`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DiseaseKey(String);

impl DiseaseKey {
    pub fn new(plant: &str, condition: &str) -> Self {
        Self(format!("{}___{}", normalise(plant), normalise(condition)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiseaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalise(part: &str) -> String {
    part.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Severity of one risk dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::Low => "LOW",
        }
    }

    /// Display colour as 8-bit RGB.
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            RiskLevel::High => (0xC0, 0x39, 0x2B),
            RiskLevel::Moderate => (0xE6, 0x7E, 0x22),
            RiskLevel::Low => (0x52, 0xB7, 0x88),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SymptomStage {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrganicTreatment {
    pub product: &'static str,
    pub dosage: &'static str,
    pub frequency: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChemicalTreatment {
    pub active_ingredient: &'static str,
    pub trade_name: &'static str,
    pub dosage: &'static str,
    pub notes: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Risk {
    pub label: &'static str,
    pub level: RiskLevel,
    pub description: &'static str,
}

/// One complete disease entry. Every field is always populated.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DiseaseRecord {
    pub plant: &'static str,
    pub condition: &'static str,
    pub pathogen: &'static str,
    /// (rank, value) pairs, kingdom first.
    pub taxonomy: &'static [(&'static str, &'static str)],
    pub overview: &'static str,
    pub symptoms: &'static [SymptomStage],
    pub organic_treatments: &'static [OrganicTreatment],
    pub chemical_treatments: &'static [ChemicalTreatment],
    pub risks: &'static [Risk],
    pub prevention: &'static [&'static str],
}

impl DiseaseRecord {
    pub fn key(&self) -> DiseaseKey {
        DiseaseKey::new(self.plant, self.condition)
    }
}

/// Read-only table of disease records.
pub struct KnowledgeBase {
    records: HashMap<DiseaseKey, &'static DiseaseRecord>,
}

impl KnowledgeBase {
    /// Knowledge base holding every compiled-in record.
    pub fn builtin() -> Self {
        Self::from_records(catalog::RECORDS)
    }

    pub fn from_records(records: &'static [DiseaseRecord]) -> Self {
        let records = records.iter().map(|r| (r.key(), r)).collect();
        Self { records }
    }

    pub fn lookup(&self, plant: &str, condition: &str) -> Result<&'static DiseaseRecord, KnowledgeError> {
        self.records
            .get(&DiseaseKey::new(plant, condition))
            .copied()
            .ok_or_else(|| KnowledgeError::NotFound {
                plant: plant.to_string(),
                condition: condition.to_string(),
            })
    }

    pub fn contains(&self, plant: &str, condition: &str) -> bool {
        self.records.contains_key(&DiseaseKey::new(plant, condition))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
