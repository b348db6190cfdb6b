//! Data models for the profile quality auditor.
//!
//! This module contains the record wrapper returned by the profile service,
//! the running accumulators used during aggregation, and the immutable
//! analysis snapshot consumed by the report generators.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Quality score at or above which a category is rated good.
pub const CATEGORY_GOOD_THRESHOLD: f64 = 80.0;
/// Quality score at or above which a category is rated warning.
pub const CATEGORY_WARNING_THRESHOLD: f64 = 60.0;
/// Missing percentage below which a field is rated good.
pub const FIELD_GOOD_THRESHOLD: f64 = 20.0;
/// Missing percentage below which a field is rated warning.
pub const FIELD_WARNING_THRESHOLD: f64 = 40.0;

/// A single opaque record returned by the profile service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Value);

impl Record {
    /// Returns the nested data object stored under `data_key`.
    ///
    /// Records that are not objects, or whose nested value is absent or not
    /// an object, yield `None` and are analyzed as if the object were empty.
    pub fn data(&self, data_key: &str) -> Option<&Map<String, Value>> {
        self.0.get(data_key).and_then(Value::as_object)
    }
}

/// Returns true if a checked field's value counts as missing.
///
/// Absent, null, the empty string and the empty array are missing. Every
/// other value, including `0`, `false` and `{}`, is present.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Returns true if a JSON value is falsy (null, false, 0, "", [] or {}).
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Three-tier qualitative rating used in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Good,
    Warning,
    Bad,
}

impl QualityTier {
    /// Rates a category by its quality score.
    pub fn for_quality_score(score: f64) -> Self {
        if score >= CATEGORY_GOOD_THRESHOLD {
            QualityTier::Good
        } else if score >= CATEGORY_WARNING_THRESHOLD {
            QualityTier::Warning
        } else {
            QualityTier::Bad
        }
    }

    /// Rates a field by its missing percentage.
    pub fn for_missing_percentage(percentage: f64) -> Self {
        if percentage < FIELD_GOOD_THRESHOLD {
            QualityTier::Good
        } else if percentage < FIELD_WARNING_THRESHOLD {
            QualityTier::Warning
        } else {
            QualityTier::Bad
        }
    }

    /// CSS class name used by the HTML report.
    pub fn css_class(&self) -> &'static str {
        match self {
            QualityTier::Good => "good",
            QualityTier::Warning => "warning",
            QualityTier::Bad => "bad",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.css_class())
    }
}

/// Running totals for one checked field across all records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldStat {
    pub total: usize,
    pub missing: usize,
}

/// Running totals for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryStat {
    /// Number of records grouped under this category.
    pub count: usize,
    /// Missing counts per field, in the order fields first went missing.
    pub missing_fields: Vec<FieldCount>,
}

impl CategoryStat {
    /// Records one missing occurrence of `field`, inserting it if absent.
    pub fn record_missing(&mut self, field: &str) {
        match self.missing_fields.iter_mut().find(|f| f.field == field) {
            Some(entry) => entry.missing += 1,
            None => self.missing_fields.push(FieldCount {
                field: field.to_string(),
                missing: 1,
            }),
        }
    }

    /// Sum of all per-field missing counts.
    pub fn total_missing(&self) -> usize {
        self.missing_fields.iter().map(|f| f.missing).sum()
    }
}

/// Missing count for one field within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCount {
    pub field: String,
    pub missing: usize,
}

/// Final statistics for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
    /// Percentage of checked values missing, rounded to one decimal.
    pub missing_percentage: f64,
    /// `100 - missing_percentage`, rounded to one decimal.
    pub quality_score: f64,
    pub field_breakdown: Vec<FieldCount>,
}

impl CategorySummary {
    pub fn tier(&self) -> QualityTier {
        QualityTier::for_quality_score(self.quality_score)
    }
}

/// Final statistics for one checked field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field: String,
    pub total: usize,
    pub missing: usize,
    /// Rounded to one decimal.
    pub missing_percentage: f64,
}

impl FieldSummary {
    pub fn tier(&self) -> QualityTier {
        QualityTier::for_missing_percentage(self.missing_percentage)
    }
}

/// Immutable result of analyzing a record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Categories ordered by record count, highest first.
    pub categories: Vec<CategorySummary>,
    /// Fields ordered by missing percentage, highest first.
    pub fields: Vec<FieldSummary>,
}

impl AnalysisResult {
    /// Mean quality score across categories, or 0 when there are none.
    pub fn average_quality(&self) -> f64 {
        if self.categories.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.categories.iter().map(|c| c.quality_score).sum();
        sum / self.categories.len() as f64
    }

    /// Total records across all categories.
    pub fn total_records(&self) -> usize {
        self.categories.iter().map(|c| c.count).sum()
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report title shown in the header.
    pub title: String,
    /// Endpoint the records were fetched from.
    pub endpoint: String,
    /// Local time the report was generated.
    pub generated_at: DateTime<Local>,
    /// Number of records fetched.
    pub total_records: usize,
    /// Number of pages that returned data.
    pub pages_fetched: usize,
    /// Set when fetching stopped on an error; holds the cause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_cause: Option<String>,
}

/// A complete quality report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub analysis: AnalysisResult,
}
