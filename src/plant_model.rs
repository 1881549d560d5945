//! Data model definitions for plant analysis and storage.
//!
//! This module defines the typed records that flow through the core: the
//! normalized AI output ([`AnalysisResult`] / [`NonPlantResult`], wrapped in a
//! [`Classification`]), the persisted [`SavedPlant`], and the inputs the store
//! accepts ([`PlantDraft`] for creation, [`PlantUpdate`] for partial merges).
//!
//! Every type serializes with camelCase field names, which is the layout the
//! Flutter host reads and the layout of the persisted collection.
//!
//! # Backward compatibility
//!
//! There is no schema version on the stored collection. Every field that is not
//! an identity field carries a serde default, so a blob written by an older build
//! (missing newer fields) still loads; missing values take the same fallbacks the
//! normalizer uses for AI payloads.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::record_normalizer::{deserialize_optional_score, deserialize_score};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 100;

/// Score used when the AI payload carries no usable number.
pub const FALLBACK_SCORE: u8 = 50;

pub const FALLBACK_PLANT_NAME: &str = "Unknown Plant";
pub const FALLBACK_COMMON_NAME: &str = "Unidentified Species";
pub const FALLBACK_HEALTH_STATUS: &str = "unknown";
pub const FALLBACK_DIAGNOSIS: &str =
    "Unable to determine the plant's condition from the provided image.";
pub const FALLBACK_FACT: &str = "Unknown";
pub const FALLBACK_OVERALL_CONDITION: &str = "Unknown";

pub const FALLBACK_CARE_ADVICE: [&str; 4] = [
    "Water when the top inch of soil feels dry",
    "Provide bright, indirect sunlight",
    "Use a pot with drainage holes to prevent root rot",
    "Check leaves regularly for pests and discoloration",
];
pub const FALLBACK_STRENGTHS: [&str; 1] = ["No specific strengths identified"];
pub const FALLBACK_CONCERNS: [&str; 1] = ["No specific concerns identified"];
pub const FALLBACK_RECOMMENDATIONS: [&str; 1] =
    ["Continue regular care and monitor the plant for changes"];

pub const FALLBACK_OBJECT_TYPE: &str = "Unknown object";
pub const FALLBACK_OBJECT_NAME: &str = "Unidentified object";
pub const FALLBACK_EXPLANATION: &str =
    "The image does not appear to contain a plant.";
pub const FALLBACK_WHY_NOT_PLANT: &str =
    "No plant features such as leaves, stems or flowers could be detected.";

/// A plant with a score at or above this is counted as healthy.
pub const HEALTHY_SCORE_THRESHOLD: u8 = 80;

/// A plant with a score below this is counted as needing care.
pub const CARE_SCORE_THRESHOLD: u8 = 60;

/// Days after the last watering before a plant needs water again.
pub const WATERING_INTERVAL_DAYS: i64 = 7;

/// Clamps an arbitrary integer into the `[MIN_SCORE, MAX_SCORE]` range.
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8
}

pub(crate) fn fallback_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn default_plant_name() -> String {
    FALLBACK_PLANT_NAME.to_string()
}

fn default_common_name() -> String {
    FALLBACK_COMMON_NAME.to_string()
}

fn default_score() -> u8 {
    FALLBACK_SCORE
}

fn default_health_status() -> String {
    FALLBACK_HEALTH_STATUS.to_string()
}

fn default_diagnosis() -> String {
    FALLBACK_DIAGNOSIS.to_string()
}

fn default_care_advice() -> Vec<String> {
    fallback_list(&FALLBACK_CARE_ADVICE)
}

fn default_fact() -> String {
    FALLBACK_FACT.to_string()
}

fn default_overall_condition() -> String {
    FALLBACK_OVERALL_CONDITION.to_string()
}

fn default_strengths() -> Vec<String> {
    fallback_list(&FALLBACK_STRENGTHS)
}

fn default_concerns() -> Vec<String> {
    fallback_list(&FALLBACK_CONCERNS)
}

fn default_recommendations() -> Vec<String> {
    fallback_list(&FALLBACK_RECOMMENDATIONS)
}

/// At-a-glance botanical facts about the identified plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickFacts {
    #[serde(default = "default_fact")]
    pub origin: String,
    #[serde(default = "default_fact")]
    pub difficulty: String,
    #[serde(default = "default_fact")]
    pub growth_rate: String,
    #[serde(default = "default_fact")]
    pub toxicity: String,
    #[serde(default = "default_fact")]
    pub light_requirement: String,
    #[serde(default = "default_fact")]
    pub water_frequency: String,
    #[serde(default = "default_fact")]
    pub humidity: String,
    #[serde(default = "default_fact")]
    pub temperature: String,
}

impl Default for QuickFacts {
    fn default() -> Self {
        Self {
            origin: default_fact(),
            difficulty: default_fact(),
            growth_rate: default_fact(),
            toxicity: default_fact(),
            light_requirement: default_fact(),
            water_frequency: default_fact(),
            humidity: default_fact(),
            temperature: default_fact(),
        }
    }
}

/// Qualitative health breakdown. The three lists are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInsights {
    #[serde(default = "default_overall_condition")]
    pub overall_condition: String,
    #[serde(default = "default_strengths")]
    pub strengths: Vec<String>,
    #[serde(default = "default_concerns")]
    pub concerns: Vec<String>,
    #[serde(default = "default_recommendations")]
    pub recommendations: Vec<String>,
}

impl Default for HealthInsights {
    fn default() -> Self {
        Self {
            overall_condition: default_overall_condition(),
            strengths: default_strengths(),
            concerns: default_concerns(),
            recommendations: default_recommendations(),
        }
    }
}

/// A normalized plant analysis, not yet persisted.
///
/// Produced by [`crate::record_normalizer::normalize`]. `confidence` and
/// `health_score` are always within `[1, 100]` and every list is non-empty.
///
/// # Examples
///
/// ```rust
/// use plant_care_core::plant_model::AnalysisResult;
///
/// let analysis = AnalysisResult::default();
/// assert_eq!(analysis.plant_name, "Unknown Plant");
/// assert_eq!(analysis.care_advice.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default = "default_plant_name")]
    pub plant_name: String,
    #[serde(default = "default_common_name")]
    pub common_name: String,
    #[serde(default = "default_score", deserialize_with = "deserialize_score")]
    pub confidence: u8,
    #[serde(default = "default_score", deserialize_with = "deserialize_score")]
    pub health_score: u8,
    #[serde(default = "default_health_status")]
    pub health_status: String,
    #[serde(default = "default_diagnosis")]
    pub diagnosis: String,
    #[serde(default = "default_care_advice")]
    pub care_advice: Vec<String>,
    #[serde(default)]
    pub quick_facts: QuickFacts,
    #[serde(default)]
    pub health_insights: HealthInsights,
    #[serde(default)]
    pub identification_id: String,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            plant_name: default_plant_name(),
            common_name: default_common_name(),
            confidence: FALLBACK_SCORE,
            health_score: FALLBACK_SCORE,
            health_status: default_health_status(),
            diagnosis: default_diagnosis(),
            care_advice: default_care_advice(),
            quick_facts: QuickFacts::default(),
            health_insights: HealthInsights::default(),
            identification_id: String::new(),
            timestamp: DateTime::<Utc>::default(),
        }
    }
}

/// The alternate shape produced when the AI reports the subject is not a plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonPlantResult {
    pub object_type: String,
    pub object_name: String,
    pub explanation: String,
    pub why_not_plant: String,
}

/// Output of the normalization pipeline.
///
/// Serialized with a `kind` tag so the host can branch without probing fields:
/// `{"kind":"plant", ...}` or `{"kind":"nonPlant", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Classification {
    Plant(AnalysisResult),
    NonPlant(NonPlantResult),
}

impl Classification {
    pub fn is_plant(&self) -> bool {
        matches!(self, Classification::Plant(_))
    }

    pub fn into_analysis(self) -> Option<AnalysisResult> {
        match self {
            Classification::Plant(analysis) => Some(analysis),
            Classification::NonPlant(_) => None,
        }
    }
}

/// Everything needed to save a plant, minus the store-assigned `id` and
/// `dateAdded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantDraft {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    #[serde(default)]
    pub image_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watered: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fertilized: Option<DateTime<Utc>>,
}

impl PlantDraft {
    pub fn new(analysis: AnalysisResult, image_uri: impl Into<String>) -> Self {
        Self {
            analysis,
            image_uri: image_uri.into(),
            custom_name: None,
            notes: None,
            last_watered: None,
            last_fertilized: None,
        }
    }
}

/// A plant record as persisted by [`crate::plant_store::PlantRecordStore`].
///
/// `id` and `date_added` are assigned by the store on creation and never change.
/// The analysis fields are flattened into the same JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlant {
    pub id: String,
    #[serde(default)]
    pub date_added: DateTime<Utc>,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    #[serde(default)]
    pub image_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watered: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fertilized: Option<DateTime<Utc>>,
}

impl SavedPlant {
    pub fn from_draft(draft: PlantDraft, id: String, date_added: DateTime<Utc>) -> Self {
        Self {
            id,
            date_added,
            analysis: draft.analysis,
            image_uri: draft.image_uri,
            custom_name: draft.custom_name,
            notes: draft.notes,
            last_watered: draft.last_watered,
            last_fertilized: draft.last_fertilized,
        }
    }

    /// The user's nickname if set, otherwise the identified common name.
    pub fn display_name(&self) -> &str {
        match self.custom_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.analysis.common_name,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.analysis.health_status.eq_ignore_ascii_case("healthy")
            || self.analysis.health_score >= HEALTHY_SCORE_THRESHOLD
    }

    pub fn needs_care(&self) -> bool {
        self.analysis.health_status.eq_ignore_ascii_case("poor")
            || self.analysis.health_score < CARE_SCORE_THRESHOLD
    }

    /// True when the plant was never watered or the last watering is at least
    /// [`WATERING_INTERVAL_DAYS`] before `now`.
    pub fn needs_water(&self, now: DateTime<Utc>) -> bool {
        match self.last_watered {
            None => true,
            Some(watered) => now.signed_duration_since(watered) >= Duration::days(WATERING_INTERVAL_DAYS),
        }
    }

    /// Merges the fields present in `patch`, leaving every other field untouched.
    pub fn apply(&mut self, patch: PlantUpdate) {
        if let Some(custom_name) = patch.custom_name {
            self.custom_name = Some(custom_name);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(last_watered) = patch.last_watered {
            self.last_watered = Some(last_watered);
        }
        if let Some(last_fertilized) = patch.last_fertilized {
            self.last_fertilized = Some(last_fertilized);
        }
        if let Some(image_uri) = patch.image_uri {
            self.image_uri = image_uri;
        }
        if let Some(health_status) = patch.health_status {
            let trimmed = health_status.trim();
            self.analysis.health_status = if trimmed.is_empty() {
                default_health_status()
            } else {
                trimmed.to_string()
            };
        }
        if let Some(health_score) = patch.health_score {
            self.analysis.health_score = clamp_score(health_score);
        }
    }
}

/// Partial fields for [`crate::plant_store::PlantRecordStore::update`].
///
/// `None` means "leave untouched". Identity fields are deliberately absent, and
/// unknown keys in incoming JSON (such as `id`) are ignored. A `healthScore`
/// that is not numeric becomes the fallback score, and a blank `healthStatus`
/// becomes `"unknown"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watered: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_fertilized: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_status: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_score"
    )]
    pub health_score: Option<i64>,
}

impl PlantUpdate {
    pub fn is_empty(&self) -> bool {
        *self == PlantUpdate::default()
    }
}

/// Aggregate statistics over a plant collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantStats {
    pub total_plants: usize,
    pub healthy_plants: usize,
    pub plants_needing_care: usize,
    pub plants_needing_water: usize,
    pub average_health_score: u8,
}
