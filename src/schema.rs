//! Request and model-response schemas with structural validation.
//!
//! The same check-and-report machinery covers both directions: the inbound
//! `AnalysisRequest` body and the model's `AnalysisCore` output. Validation
//! collects every field violation rather than stopping at the first, so a
//! caller sees the complete list in one round trip. Out-of-range numbers are
//! rejected, never clamped; omitted collection fields default to empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum accepted story length in characters.
pub const MIN_STORY_CHARS: usize = 20;

const UNFAIRNESS_MIN: f64 = 0.0;
const UNFAIRNESS_MAX: f64 = 100.0;

/// A single schema violation, addressed by JSON-path-like field name.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Optional structured context accompanying a story. All fields are
/// free-text except the self rating.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_or_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_self_rating: Option<f64>,
}

/// Validated inbound request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub story_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<StoryContext>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Factor {
    pub label: String,
    pub description: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResourceLink {
    pub label: String,
    pub url: String,
}

/// The model-produced structured result, after validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCore {
    pub analysis_summary: String,
    pub unfairness_score: f64,
    #[serde(default)]
    pub factors: Vec<Factor>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub resource_links: Vec<ResourceLink>,
    #[serde(default)]
    pub reframes: Vec<String>,
    #[serde(default)]
    pub safety_notes: Vec<String>,
}

/// Metadata attached to a successful analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub story_length: usize,
    pub received_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<StoryContext>,
    pub model: String,
}

/// The response payload: validated core plus metadata. Constructed once per
/// request and never mutated afterward.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FairlyHumanAnalysis {
    #[serde(flatten)]
    pub core: AnalysisCore,
    pub metadata: AnalysisMetadata,
}

const CONTEXT_STRING_FIELDS: [&str; 5] = [
    "country",
    "stateOrRegion",
    "roleType",
    "employmentType",
    "industry",
];

/// Validate an arbitrary JSON body against `AnalysisRequest`. Returns the
/// typed value or every field violation found.
pub fn parse_analysis_request(body: &Value) -> Result<AnalysisRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let obj = match body.as_object() {
        Some(obj) => obj,
        None => {
            return Err(vec![FieldError::new("", "request body must be a JSON object")]);
        }
    };

    let story_text = match obj.get("storyText") {
        Some(Value::String(s)) => {
            if s.chars().count() < MIN_STORY_CHARS {
                errors.push(FieldError::new(
                    "storyText",
                    format!("Story should be at least {} characters.", MIN_STORY_CHARS),
                ));
            }
            Some(s.clone())
        }
        Some(_) => {
            errors.push(FieldError::new("storyText", "must be a string"));
            None
        }
        None => {
            errors.push(FieldError::new("storyText", "is required"));
            None
        }
    };

    let context = match obj.get("context") {
        None | Some(Value::Null) => None,
        Some(value) => parse_context(value, &mut errors),
    };

    if errors.is_empty() {
        // story_text is always Some when no errors were recorded
        Ok(AnalysisRequest {
            story_text: story_text.unwrap_or_default(),
            context,
        })
    } else {
        Err(errors)
    }
}

fn parse_context(value: &Value, errors: &mut Vec<FieldError>) -> Option<StoryContext> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            errors.push(FieldError::new("context", "must be an object"));
            return None;
        }
    };

    let mut ctx = StoryContext::default();
    for (key, val) in obj {
        let path = format!("context.{}", key);
        if CONTEXT_STRING_FIELDS.contains(&key.as_str()) {
            match val {
                Value::String(s) => {
                    let s = Some(s.clone());
                    match key.as_str() {
                        "country" => ctx.country = s,
                        "stateOrRegion" => ctx.state_or_region = s,
                        "roleType" => ctx.role_type = s,
                        "employmentType" => ctx.employment_type = s,
                        "industry" => ctx.industry = s,
                        _ => unreachable!("key is one of CONTEXT_STRING_FIELDS"),
                    }
                }
                // Explicit null is a type error; only absence is optional.
                _ => errors.push(FieldError::new(path, "must be a string")),
            }
        } else if key == "severitySelfRating" {
            match val.as_f64() {
                Some(n) if (1.0..=5.0).contains(&n) => ctx.severity_self_rating = Some(n),
                Some(_) => errors.push(FieldError::new(path, "must be between 1 and 5")),
                None => errors.push(FieldError::new(path, "must be a number")),
            }
        } else {
            errors.push(FieldError::new(path, "unrecognized field"));
        }
    }
    Some(ctx)
}

/// Validate the model's returned payload against `AnalysisCore`. The model
/// is fallible and must never be trusted to stay inside declared bounds;
/// any wrong type, missing required field or out-of-range number fails the
/// whole response.
pub fn parse_analysis_core(value: &Value) -> Result<AnalysisCore, Vec<FieldError>> {
    let mut errors = Vec::new();

    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            return Err(vec![FieldError::new("", "model output must be a JSON object")]);
        }
    };

    let analysis_summary = match obj.get("analysisSummary") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::new("analysisSummary", "must be a string"));
            None
        }
        None => {
            errors.push(FieldError::new("analysisSummary", "is required"));
            None
        }
    };

    let unfairness_score = match obj.get("unfairnessScore").map(Value::as_f64) {
        Some(Some(n)) if (UNFAIRNESS_MIN..=UNFAIRNESS_MAX).contains(&n) => Some(n),
        Some(Some(_)) => {
            errors.push(FieldError::new("unfairnessScore", "must be between 0 and 100"));
            None
        }
        Some(None) => {
            errors.push(FieldError::new("unfairnessScore", "must be a number"));
            None
        }
        None => {
            errors.push(FieldError::new("unfairnessScore", "is required"));
            None
        }
    };

    let factors = parse_array(obj.get("factors"), "factors", &mut errors, parse_factor);
    let suggestions = parse_array(obj.get("suggestions"), "suggestions", &mut errors, parse_string);
    let resource_links = parse_array(
        obj.get("resourceLinks"),
        "resourceLinks",
        &mut errors,
        parse_resource_link,
    );
    let reframes = parse_array(obj.get("reframes"), "reframes", &mut errors, parse_string);
    let safety_notes = parse_array(obj.get("safetyNotes"), "safetyNotes", &mut errors, parse_string);

    if errors.is_empty() {
        Ok(AnalysisCore {
            analysis_summary: analysis_summary.unwrap_or_default(),
            unfairness_score: unfairness_score.unwrap_or_default(),
            factors,
            suggestions,
            resource_links,
            reframes,
            safety_notes,
        })
    } else {
        Err(errors)
    }
}

/// Apply the declared default (empty) for an absent array, otherwise check
/// every element and record each violation under its index.
fn parse_array<T>(
    value: Option<&Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
    mut element: impl FnMut(&Value, &str, &mut Vec<FieldError>) -> Option<T>,
) -> Vec<T> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                if let Some(parsed) = element(item, &format!("{}[{}]", field, i), errors) {
                    out.push(parsed);
                }
            }
            out
        }
        Some(_) => {
            errors.push(FieldError::new(field, "must be an array"));
            Vec::new()
        }
    }
}

fn parse_string(value: &Value, path: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => {
            errors.push(FieldError::new(path, "must be a string"));
            None
        }
    }
}

fn parse_factor(value: &Value, path: &str, errors: &mut Vec<FieldError>) -> Option<Factor> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            errors.push(FieldError::new(path, "must be an object"));
            return None;
        }
    };
    let label = require_string(obj.get("label"), &format!("{}.label", path), errors);
    let description = require_string(
        obj.get("description"),
        &format!("{}.description", path),
        errors,
    );
    let weight = match obj.get("weight").map(Value::as_f64) {
        Some(Some(w)) if (0.0..=1.0).contains(&w) => Some(w),
        Some(_) => {
            errors.push(FieldError::new(
                format!("{}.weight", path),
                "must be a number between 0 and 1",
            ));
            None
        }
        None => {
            errors.push(FieldError::new(format!("{}.weight", path), "is required"));
            None
        }
    };
    Some(Factor {
        label: label?,
        description: description?,
        weight: weight?,
    })
}

fn parse_resource_link(value: &Value, path: &str, errors: &mut Vec<FieldError>) -> Option<ResourceLink> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            errors.push(FieldError::new(path, "must be an object"));
            return None;
        }
    };
    let label = require_string(obj.get("label"), &format!("{}.label", path), errors);
    let url = require_string(obj.get("url"), &format!("{}.url", path), errors);
    Some(ResourceLink {
        label: label?,
        url: url?,
    })
}

fn require_string(value: Option<&Value>, path: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::new(path, "must be a string"));
            None
        }
        None => {
            errors.push(FieldError::new(path, "is required"));
            None
        }
    }
}
