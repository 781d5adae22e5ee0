//! Filter criteria and their validation.
//!
//! Criteria arrive either typed (CLI, config schedule) or as an untyped JSON
//! payload from the invocation contract. Both paths go through the same
//! per-field checks, and both report every problem at once instead of
//! stopping at the first one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::content::CategoryId;
use crate::store::ContentStore;

/// Selection rule for stale content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub content_types: Vec<String>,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    pub age_threshold_days: i64,
    pub engagement_threshold: i64,
}

impl Default for FilterCriteria {
    /// One year old and fewer than ten views or comments, posts only
    fn default() -> Self {
        Self {
            content_types: vec!["post".to_string()],
            category_ids: Vec::new(),
            age_threshold_days: 365,
            engagement_threshold: 10,
        }
    }
}

impl FilterCriteria {
    pub fn new(
        content_types: impl IntoIterator<Item = impl Into<String>>,
        age_threshold_days: i64,
        engagement_threshold: i64,
    ) -> Self {
        Self {
            content_types: content_types.into_iter().map(Into::into).collect(),
            category_ids: Vec::new(),
            age_threshold_days,
            engagement_threshold,
        }
    }

    pub fn with_categories(mut self, category_ids: impl IntoIterator<Item = CategoryId>) -> Self {
        self.category_ids = category_ids.into_iter().collect();
        self
    }

    /// Publication cutoff used to pre-filter at the store level.
    ///
    /// A threshold reaching past the earliest representable instant clamps
    /// to that instant, so nothing is old enough.
    pub fn published_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Duration::try_days(self.age_threshold_days)
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Check the criteria against the store's known types and categories.
    ///
    /// All failing fields are reported together, in field order.
    pub fn validate<S: ContentStore + ?Sized>(&self, store: &S) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        check_content_types(&self.content_types, store, &mut errors);
        check_categories(&self.category_ids, store, &mut errors);
        check_age_threshold(self.age_threshold_days, &mut errors);
        check_engagement_threshold(self.engagement_threshold, &mut errors);
        ValidationErrors::check(errors)
    }
}

/// A single reason a scan request was rejected.
///
/// The display text is the caller-visible message; `detail()` carries the
/// offending value for logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("Select a post type.")]
    MissingContentTypes,

    #[error("Invalid post type.")]
    UnknownContentType(String),

    #[error("Invalid category ID.")]
    UnknownCategory(String),

    #[error("Invalid age_threshold value.")]
    InvalidAgeThreshold(String),

    #[error("Invalid engagement_threshold value.")]
    InvalidEngagementThreshold(String),
}

impl CriteriaError {
    /// Operator-facing description including the rejected value
    pub fn detail(&self) -> String {
        match self {
            Self::MissingContentTypes => "missing content types".to_string(),
            Self::UnknownContentType(t) => format!("unknown content type: {t}"),
            Self::UnknownCategory(c) => format!("unknown category: {c}"),
            Self::InvalidAgeThreshold(v) => format!("age threshold must be positive (got {v})"),
            Self::InvalidEngagementThreshold(v) => {
                format!("engagement threshold must be non-negative (got {v})")
            }
        }
    }
}

/// Every validation failure found in one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<CriteriaError>);

impl ValidationErrors {
    /// `Ok` when nothing was collected
    pub fn check(errors: Vec<CriteriaError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }

    pub fn errors(&self) -> &[CriteriaError] {
        &self.0
    }

    pub fn contains(&self, error: &CriteriaError) -> bool {
        self.0.contains(error)
    }

    /// Log-friendly variant of the combined message
    pub fn details(&self) -> Vec<String> {
        self.0.iter().map(CriteriaError::detail).collect()
    }
}

impl From<Vec<CriteriaError>> for ValidationErrors {
    fn from(errors: Vec<CriteriaError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    /// Messages joined by a single space
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Untyped scan request as received from the invocation contract.
///
/// Scalars are accepted where lists are expected and numeric strings are
/// accepted for integers, matching what form-encoded callers send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawScanRequest {
    #[serde(default)]
    pub post_types: Option<Value>,
    #[serde(default)]
    pub categories: Option<Value>,
    #[serde(default)]
    pub age_threshold: Option<Value>,
    #[serde(default)]
    pub engagement_threshold: Option<Value>,
}

impl RawScanRequest {
    /// Build from a request body; anything but an object counts as empty
    pub fn from_body(body: &Value) -> Self {
        match body {
            Value::Object(map) => Self {
                post_types: map.get("post_types").cloned(),
                categories: map.get("categories").cloned(),
                age_threshold: map.get("age_threshold").cloned(),
                engagement_threshold: map.get("engagement_threshold").cloned(),
            },
            _ => Self::default(),
        }
    }

    /// Parse and validate into typed criteria, collecting every error.
    pub fn parse<S: ContentStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<FilterCriteria, ValidationErrors> {
        let mut errors = Vec::new();

        let content_types = match parse_content_types(self.post_types.as_ref()) {
            Ok(types) => {
                check_content_types(&types, store, &mut errors);
                types
            }
            Err(err) => {
                errors.push(err);
                Vec::new()
            }
        };

        let category_ids = match parse_categories(self.categories.as_ref()) {
            Ok(ids) => {
                check_categories(&ids, store, &mut errors);
                ids
            }
            Err(err) => {
                errors.push(err);
                Vec::new()
            }
        };

        let age_threshold_days = match parse_integer(self.age_threshold.as_ref()) {
            Some(age) => {
                check_age_threshold(age, &mut errors);
                age
            }
            None => {
                errors.push(CriteriaError::InvalidAgeThreshold(describe(
                    self.age_threshold.as_ref(),
                )));
                0
            }
        };

        let engagement_threshold = match parse_integer(self.engagement_threshold.as_ref()) {
            Some(engagement) => {
                check_engagement_threshold(engagement, &mut errors);
                engagement
            }
            None => {
                errors.push(CriteriaError::InvalidEngagementThreshold(describe(
                    self.engagement_threshold.as_ref(),
                )));
                0
            }
        };

        ValidationErrors::check(errors)?;
        Ok(FilterCriteria {
            content_types,
            category_ids,
            age_threshold_days,
            engagement_threshold,
        })
    }
}

fn check_content_types<S: ContentStore + ?Sized>(
    types: &[String],
    store: &S,
    errors: &mut Vec<CriteriaError>,
) {
    if types.is_empty() {
        errors.push(CriteriaError::MissingContentTypes);
        return;
    }
    for content_type in types {
        if !store.content_type_exists(content_type) {
            errors.push(CriteriaError::UnknownContentType(content_type.clone()));
        }
    }
}

fn check_categories<S: ContentStore + ?Sized>(
    ids: &[CategoryId],
    store: &S,
    errors: &mut Vec<CriteriaError>,
) {
    for id in ids {
        if !store.category_exists(*id) {
            errors.push(CriteriaError::UnknownCategory(id.to_string()));
        }
    }
}

fn check_age_threshold(age: i64, errors: &mut Vec<CriteriaError>) {
    if age <= 0 {
        errors.push(CriteriaError::InvalidAgeThreshold(age.to_string()));
    }
}

fn check_engagement_threshold(engagement: i64, errors: &mut Vec<CriteriaError>) {
    if engagement < 0 {
        errors.push(CriteriaError::InvalidEngagementThreshold(engagement.to_string()));
    }
}

fn parse_content_types(value: Option<&Value>) -> Result<Vec<String>, CriteriaError> {
    let values: Vec<&Value> = match value {
        None | Some(Value::Null) => return Err(CriteriaError::MissingContentTypes),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    };

    let mut types: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let Value::String(s) = value else {
            return Err(CriteriaError::UnknownContentType(value.to_string()));
        };
        let s = s.trim();
        if !s.is_empty() && !types.iter().any(|t| t == s) {
            types.push(s.to_string());
        }
    }

    if types.is_empty() {
        return Err(CriteriaError::MissingContentTypes);
    }
    Ok(types)
}

fn parse_categories(value: Option<&Value>) -> Result<Vec<CategoryId>, CriteriaError> {
    let values: Vec<&Value> = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    };

    let mut ids = Vec::with_capacity(values.len());
    for value in values {
        let id = parse_integer(Some(value))
            .and_then(|id| CategoryId::try_from(id).ok())
            .ok_or_else(|| CriteriaError::UnknownCategory(value.to_string()))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn parse_integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "missing".to_string(), Value::to_string)
}
