use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

/// Name shown when the backend sends nothing usable for `meal_name`.
const UNNAMED_MEAL: &str = "Unnamed meal";

/// Per-meal nutrient estimate. The backend keys these with display labels
/// (`"Protein (g)"` etc.), kept as serde renames so save requests round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    #[serde(rename = "Calories", default, deserialize_with = "de_non_negative")]
    pub calories: f64,
    #[serde(rename = "Protein (g)", default, deserialize_with = "de_non_negative")]
    pub protein_g: f64,
    #[serde(rename = "Carbs (g)", default, deserialize_with = "de_non_negative")]
    pub carbs_g: f64,
    #[serde(rename = "Fat (g)", default, deserialize_with = "de_non_negative")]
    pub fat_g: f64,
}

/// Meal categories accepted by the backend. Anything it sends outside this
/// set (legacy rows carry e.g. `unlabeled`) lands on `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
    Drinks,
    Dessert,
    #[default]
    #[serde(other)]
    Other,
}

impl FoodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodType::Breakfast => "breakfast",
            FoodType::Lunch => "lunch",
            FoodType::Dinner => "dinner",
            FoodType::Snacks => "snacks",
            FoodType::Drinks => "drinks",
            FoodType::Dessert => "dessert",
            FoodType::Other => "other",
        }
    }
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved meal as the backend returns it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Meal {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default = "default_meal_name", deserialize_with = "de_meal_name")]
    pub meal_name: String,
    #[serde(default)]
    pub food_type: FoodType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "de_meal_datetime")]
    pub meal_datetime: Option<OffsetDateTime>,
    #[serde(default)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Query parameters for the paged meal listings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MealQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub start_date: Option<OffsetDateTime>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub end_date: Option<OffsetDateTime>,
}

/// Optional date window for the summary endpoints.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DateRange {
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub start_date: Option<OffsetDateTime>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub end_date: Option<OffsetDateTime>,
}

/// Body of `save-meal`. `temp_image_public_id` correlates the save with an
/// image registered during a prior prediction.
#[derive(Debug, Clone, Serialize)]
pub struct SaveMealRequest {
    pub nutrients: Nutrients,
    pub meal_name: String,
    pub food_type: FoodType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_image_public_id: Option<String>,
}

/// Partial meal update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MealUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_type: Option<FoodType>,
}

/// One page of the meal history.
#[derive(Debug, Clone, Deserialize)]
pub struct MealsPage {
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// One page of the meal history filtered by food type.
#[derive(Debug, Clone, Deserialize)]
pub struct MealsByTypePage {
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub count: u64,
    pub food_type: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// Aggregated macros; the summary endpoints use lower-case keys, unlike the
/// per-meal labels.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MacroTotals {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NutritionSummary {
    #[serde(default)]
    pub total_nutrients: MacroTotals,
    #[serde(default)]
    pub average_nutrients: MacroTotals,
    #[serde(default)]
    pub meal_count: u64,
}

/// Per-food-type slice of the summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodTypeBreakdown {
    #[serde(default)]
    pub total_nutrients: MacroTotals,
    #[serde(default)]
    pub average_nutrients: MacroTotals,
    #[serde(default)]
    pub meal_count: u64,
}

pub type FoodTypeSummary = HashMap<String, FoodTypeBreakdown>;

/// Result of the generative-AI prediction path.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiPrediction {
    #[serde(default = "default_meal_name", deserialize_with = "de_meal_name")]
    pub meal_name: String,
    #[serde(default)]
    pub serving_size: String,
    #[serde(default)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub confidence_percentage: f64,
}

/// One ranked class from the ML food classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct MlClassPrediction {
    pub class_name: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Classifier output. `is_food` is absent on older backend builds.
#[derive(Debug, Clone, Deserialize)]
pub struct MlClassification {
    #[serde(default)]
    pub is_food: Option<bool>,
    #[serde(default)]
    pub predictions: Vec<MlClassPrediction>,
}

/// Result of the classifier + regressor path. Either half may be missing
/// independently when a model is down or detects nothing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MlPrediction {
    #[serde(default)]
    pub classification: Option<MlClassification>,
    #[serde(default)]
    pub nutrients: Option<Nutrients>,
}

/// Both prediction slots for a scan; each may be absent on its own without
/// the overall call failing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionSet {
    #[serde(default)]
    pub gemini: Option<GeminiPrediction>,
    #[serde(default)]
    pub ml: Option<MlPrediction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicesStatus {
    #[serde(default)]
    pub gemini_available: bool,
    #[serde(default)]
    pub ml_available: bool,
}

/// Failure detail for one prediction service.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionError {
    pub service: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `predict-only`. The temp image registration is only valid
/// until a save; abandoned ones are garbage collected by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictPayload {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub temp_image_url: Option<String>,
    #[serde(default)]
    pub temp_image_public_id: Option<String>,
    #[serde(default)]
    pub predictions: PredictionSet,
    #[serde(default)]
    pub services_status: Option<ServicesStatus>,
    #[serde(default)]
    pub valid_food_types: Vec<String>,
    #[serde(default)]
    pub errors: Vec<PredictionError>,
}

/// Payload of `save-meal`, echoing what was stored.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedMealPayload {
    pub meal_id: String,
    #[serde(default = "default_meal_name", deserialize_with = "de_meal_name")]
    pub meal_name: String,
    #[serde(default)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub food_type: FoodType,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodTypesPayload {
    #[serde(default)]
    pub valid_food_types: Vec<String>,
    #[serde(default)]
    pub default_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelStatusPayload {
    #[serde(default)]
    pub model_ready: bool,
}

fn default_meal_name() -> String {
    UNNAMED_MEAL.to_string()
}

/// Nutrient values are non-negative by contract; anything below zero is a
/// backend regression artifact and reads as zero.
fn de_non_negative<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.max(0.0))
}

/// Read `meal_name` through the known backend defect where it arrives as a
/// nested object (`{"meal_name": "Salad"}`) instead of a plain string.
///
/// TODO: drop the object branch once the backend serialization bug is fixed
/// upstream; its root cause is still unconfirmed.
fn de_meal_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(unwrap_meal_name(&value))
}

fn unwrap_meal_name(value: &Value) -> String {
    match value {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get("meal_name") {
                if !s.is_empty() {
                    return s.clone();
                }
            }
            // fall back to the first string value in the object
            for inner in map.values() {
                if let Value::String(s) = inner {
                    if !s.is_empty() {
                        return s.clone();
                    }
                }
            }
            warn!("object-shaped meal_name had no usable string");
            default_meal_name()
        }
        _ => default_meal_name(),
    }
}

/// Parse `meal_datetime`, which arrives without a zone marker. The backend
/// stores UTC, so a missing offset means UTC and a `Z` is appended before
/// parsing. Unreadable values degrade to `None` rather than failing the row.
fn de_meal_datetime<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else { return Ok(None) };
    let candidate = ensure_utc_marker(&raw);
    match OffsetDateTime::parse(&candidate, &Rfc3339) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!(value = %raw, error = %e, "unparseable meal_datetime");
            Ok(None)
        }
    }
}

/// Append `Z` unless the timestamp already carries an offset.
fn ensure_utc_marker(raw: &str) -> String {
    let time_part = match raw.find('T') {
        Some(idx) => &raw[idx..],
        None => raw,
    };
    let has_zone = time_part.ends_with('Z')
        || time_part.ends_with('z')
        || time_part.contains('+')
        || time_part.get(1..).is_some_and(|rest| rest.contains('-'));
    if has_zone {
        raw.to_string()
    } else {
        format!("{raw}Z")
    }
}
