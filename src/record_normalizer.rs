//! Decode-with-defaults from an untyped AI payload to a typed record.
//!
//! Content problems never fail: a missing, mistyped, blank or out-of-range field
//! is replaced by its fallback (or clamped), so the user always gets a usable
//! record. Only extraction, handled in [`crate::response_extractor`], can fail.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::PlantError;
use crate::plant_model::{
    clamp_score, fallback_list, AnalysisResult, Classification, HealthInsights,
    NonPlantResult, QuickFacts, FALLBACK_CARE_ADVICE, FALLBACK_COMMON_NAME,
    FALLBACK_CONCERNS, FALLBACK_DIAGNOSIS, FALLBACK_EXPLANATION, FALLBACK_FACT,
    FALLBACK_HEALTH_STATUS, FALLBACK_OBJECT_NAME, FALLBACK_OBJECT_TYPE,
    FALLBACK_OVERALL_CONDITION, FALLBACK_PLANT_NAME, FALLBACK_RECOMMENDATIONS,
    FALLBACK_SCORE, FALLBACK_STRENGTHS, FALLBACK_WHY_NOT_PLANT, MAX_SCORE, MIN_SCORE,
};
use crate::response_extractor::extract_json_object;

/// Runs the whole pipeline on a raw AI response.
///
/// # Errors
///
/// Returns [`PlantError::MalformedResponse`] if `raw` holds no parseable JSON
/// object. Nothing else fails.
///
/// # Examples
///
/// ```rust
/// use plant_care_core::record_normalizer::extract_and_normalize;
/// use plant_care_core::plant_model::Classification;
///
/// let raw = r#"Sure! {"isPlant": true, "plantName": "Ficus lyrata", "confidence": 140}"#;
///
/// match extract_and_normalize(raw)? {
///     Classification::Plant(analysis) => assert_eq!(analysis.confidence, 100),
///     Classification::NonPlant(_) => unreachable!(),
/// }
/// # Ok::<(), plant_care_core::error::PlantError>(())
/// ```
pub fn extract_and_normalize(raw: &str) -> Result<Classification, PlantError> {
    let payload = extract_json_object(raw)?;
    Ok(normalize(&payload))
}

/// Normalizes `payload` using the current time for `identificationId` and
/// `timestamp`.
pub fn normalize(payload: &Map<String, Value>) -> Classification {
    normalize_at(payload, Utc::now())
}

/// Normalizes `payload` as of `now`.
///
/// Only an explicit `isPlant: false` selects the non-plant shape. An absent
/// discriminator is treated as a plant.
pub fn normalize_at(payload: &Map<String, Value>, now: DateTime<Utc>) -> Classification {
    if is_explicitly_not_plant(payload.get("isPlant")) {
        info!("AI response classified the subject as not a plant");
        Classification::NonPlant(normalize_non_plant(payload))
    } else {
        let analysis = normalize_plant(payload, now);
        info!(
            "Normalized plant analysis: {} (confidence {}, health {})",
            analysis.plant_name, analysis.confidence, analysis.health_score
        );
        Classification::Plant(analysis)
    }
}

/// Re-applies the record invariants to an already-typed analysis: scores inside
/// `[1, 100]` and no empty advice or insight lists.
pub fn sanitize_analysis(analysis: &mut AnalysisResult) {
    analysis.confidence = analysis.confidence.clamp(MIN_SCORE, MAX_SCORE);
    analysis.health_score = analysis.health_score.clamp(MIN_SCORE, MAX_SCORE);

    fill_if_empty(&mut analysis.care_advice, &FALLBACK_CARE_ADVICE);
    let insights = &mut analysis.health_insights;
    fill_if_empty(&mut insights.strengths, &FALLBACK_STRENGTHS);
    fill_if_empty(&mut insights.concerns, &FALLBACK_CONCERNS);
    fill_if_empty(&mut insights.recommendations, &FALLBACK_RECOMMENDATIONS);
}

/// Serde adapter for stored and incoming score fields. Any JSON number or numeric
/// string is coerced and clamped like an AI payload score; anything else takes
/// [`FALLBACK_SCORE`].
pub(crate) fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(score_or_fallback(Some(&value)))
}

/// Like [`deserialize_score`] for patch fields, where `null` leaves the score
/// untouched.
pub(crate) fn deserialize_optional_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(i64::from(score_or_fallback(Some(&value)))))
}

fn fill_if_empty(list: &mut Vec<String>, fallback: &[&str]) {
    list.retain(|item| !item.trim().is_empty());
    if list.is_empty() {
        *list = fallback_list(fallback);
    }
}

fn normalize_plant(payload: &Map<String, Value>, now: DateTime<Utc>) -> AnalysisResult {
    AnalysisResult {
        plant_name: text_or(payload.get("plantName"), FALLBACK_PLANT_NAME),
        common_name: text_or(payload.get("commonName"), FALLBACK_COMMON_NAME),
        confidence: score_or_fallback(payload.get("confidence")),
        health_score: score_or_fallback(payload.get("healthScore")),
        health_status: text_or(payload.get("healthStatus"), FALLBACK_HEALTH_STATUS),
        diagnosis: text_or(payload.get("diagnosis"), FALLBACK_DIAGNOSIS),
        care_advice: text_list_or(payload.get("careAdvice"), &FALLBACK_CARE_ADVICE),
        quick_facts: normalize_quick_facts(payload.get("quickFacts")),
        health_insights: normalize_health_insights(payload.get("healthInsights")),
        identification_id: now.timestamp_millis().to_string(),
        timestamp: now,
    }
}

fn normalize_non_plant(payload: &Map<String, Value>) -> NonPlantResult {
    NonPlantResult {
        object_type: text_or(payload.get("objectType"), FALLBACK_OBJECT_TYPE),
        object_name: text_or(payload.get("objectName"), FALLBACK_OBJECT_NAME),
        explanation: text_or(payload.get("explanation"), FALLBACK_EXPLANATION),
        why_not_plant: text_or(payload.get("whyNotPlant"), FALLBACK_WHY_NOT_PLANT),
    }
}

fn normalize_quick_facts(value: Option<&Value>) -> QuickFacts {
    let Some(facts) = value.and_then(Value::as_object) else {
        return QuickFacts::default();
    };

    QuickFacts {
        origin: text_or(facts.get("origin"), FALLBACK_FACT),
        difficulty: text_or(facts.get("difficulty"), FALLBACK_FACT),
        growth_rate: text_or(facts.get("growthRate"), FALLBACK_FACT),
        toxicity: text_or(facts.get("toxicity"), FALLBACK_FACT),
        light_requirement: text_or(facts.get("lightRequirement"), FALLBACK_FACT),
        water_frequency: text_or(facts.get("waterFrequency"), FALLBACK_FACT),
        humidity: text_or(facts.get("humidity"), FALLBACK_FACT),
        temperature: text_or(facts.get("temperature"), FALLBACK_FACT),
    }
}

fn normalize_health_insights(value: Option<&Value>) -> HealthInsights {
    let Some(insights) = value.and_then(Value::as_object) else {
        return HealthInsights::default();
    };

    HealthInsights {
        overall_condition: text_or(insights.get("overallCondition"), FALLBACK_OVERALL_CONDITION),
        strengths: text_list_or(insights.get("strengths"), &FALLBACK_STRENGTHS),
        concerns: text_list_or(insights.get("concerns"), &FALLBACK_CONCERNS),
        recommendations: text_list_or(insights.get("recommendations"), &FALLBACK_RECOMMENDATIONS),
    }
}

/// `false`, or the string `"false"` in any case, is the only rejection.
fn is_explicitly_not_plant(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => !flag,
        Some(Value::String(text)) => text.trim().eq_ignore_ascii_case("false"),
        _ => false,
    }
}

fn text_or(value: Option<&Value>, fallback: &str) -> String {
    match value.and_then(Value::as_str).map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => fallback.to_string(),
    }
}

fn score_or_fallback(value: Option<&Value>) -> u8 {
    match value.and_then(coerce_integer) {
        Some(raw) => clamp_score(raw),
        None => {
            debug!("Score missing or not numeric, using fallback {FALLBACK_SCORE}");
            FALLBACK_SCORE
        }
    }
}

/// Integers pass through, floats round to nearest, and numeric strings (with an
/// optional trailing `%`) are parsed the same way.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(round_finite)),
        Value::String(text) => {
            let trimmed = text.trim().trim_end_matches('%').trim_end();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(round_finite))
        }
        _ => None,
    }
}

fn round_finite(value: f64) -> Option<i64> {
    // Saturating cast: huge magnitudes still clamp to the right bound.
    value.is_finite().then(|| value.round() as i64)
}

fn text_list_or(value: Option<&Value>, fallback: &[&str]) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(rows)) => rows
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    if items.is_empty() {
        fallback_list(fallback)
    } else {
        items
    }
}
