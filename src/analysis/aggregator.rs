//! Record aggregation and completeness statistics.
//!
//! A single pass over the records groups them by category and counts
//! missing values per field, globally and per category. Percentages are
//! derived afterwards and the summaries ranked for presentation.

use crate::models::{
    is_falsy, is_missing, AnalysisResult, CategoryStat, CategorySummary, FieldStat, FieldSummary,
    Record,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Settings that control how records are grouped and checked.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    /// Key of the nested object holding the analyzed fields.
    pub data_key: String,
    /// Field of the nested object used as the grouping category.
    pub category_field: String,
    /// Category used when the category field is falsy.
    pub fallback_category: String,
    /// Fields checked for missing values, in report order.
    pub fields: Vec<String>,
}

/// Category accumulators kept in first-encountered order.
#[derive(Debug, Default)]
struct CategoryTable {
    index: HashMap<String, usize>,
    entries: Vec<(String, CategoryStat)>,
}

impl CategoryTable {
    fn entry(&mut self, category: String) -> &mut CategoryStat {
        let position = match self.index.get(&category) {
            Some(&position) => position,
            None => {
                let position = self.entries.len();
                self.index.insert(category.clone(), position);
                self.entries.push((category, CategoryStat::default()));
                position
            }
        };
        &mut self.entries[position].1
    }
}

/// Round to one decimal place.
///
/// Goes through decimal formatting so the exact binary value is rounded
/// once, with ties to even.
pub fn round1(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

/// Percentage of `part` in `whole`, or 0 when `whole` is zero.
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Derive the grouping category of a record's data object.
pub fn derive_category(data: Option<&serde_json::Map<String, Value>>, settings: &AnalysisSettings) -> String {
    match data.and_then(|d| d.get(&settings.category_field)) {
        Some(value) if !is_falsy(value) => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        _ => settings.fallback_category.clone(),
    }
}

/// Analyze the records and produce ranked category and field summaries.
pub fn analyze(records: &[Record], settings: &AnalysisSettings) -> AnalysisResult {
    let mut categories = CategoryTable::default();
    let mut field_stats: Vec<(String, FieldStat)> = settings
        .fields
        .iter()
        .map(|f| (f.clone(), FieldStat::default()))
        .collect();

    for record in records {
        let data = record.data(&settings.data_key);
        let category = derive_category(data, settings);
        let category_stat = categories.entry(category);
        category_stat.count += 1;

        for (field, stat) in field_stats.iter_mut() {
            stat.total += 1;
            if is_missing(data.and_then(|d| d.get(field.as_str()))) {
                stat.missing += 1;
                category_stat.record_missing(field);
            }
        }
    }

    debug!(
        "Aggregated {} records into {} categories",
        records.len(),
        categories.entries.len()
    );

    let fields_checked = settings.fields.len();
    let mut category_summaries: Vec<CategorySummary> = categories
        .entries
        .into_iter()
        .map(|(category, stat)| {
            let missing = percentage(stat.total_missing(), stat.count * fields_checked);
            CategorySummary {
                category,
                count: stat.count,
                missing_percentage: round1(missing),
                quality_score: round1(100.0 - missing),
                field_breakdown: stat.missing_fields,
            }
        })
        .collect();

    let mut field_summaries: Vec<FieldSummary> = field_stats
        .into_iter()
        .map(|(field, stat)| FieldSummary {
            missing_percentage: round1(percentage(stat.missing, stat.total)),
            field,
            total: stat.total,
            missing: stat.missing,
        })
        .collect();

    // Both sorts are stable, so ties keep encounter order.
    category_summaries.sort_by_key(|c| std::cmp::Reverse(c.count));
    field_summaries.sort_by(|a, b| {
        b.missing_percentage
            .partial_cmp(&a.missing_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    AnalysisResult {
        categories: category_summaries,
        fields: field_summaries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QualityTier;
    use serde_json::json;

    fn settings() -> AnalysisSettings {
        AnalysisSettings {
            data_key: "json_structure".to_string(),
            category_field: "current_role".to_string(),
            fallback_category: "Unknown Role".to_string(),
            fields: ["name", "email", "skills", "current_role"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    fn profile(data: Value) -> Record {
        Record(json!({ "id": 1, "json_structure": data }))
    }

    #[test]
    fn test_all_fields_present() {
        let records: Vec<Record> = ["Engineer", "Engineer", "Designer"]
            .into_iter()
            .map(|role| {
                profile(json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "skills": ["rust"],
                    "current_role": role,
                }))
            })
            .collect();

        let result = analyze(&records, &settings());

        assert!(result.fields.iter().all(|f| f.missing_percentage == 0.0));
        assert!(result.categories.iter().all(|c| c.quality_score == 100.0));
        assert_eq!(result.categories[0].category, "Engineer");
        assert_eq!(result.categories[0].count, 2);
        assert_eq!(result.total_records(), 3);
    }

    #[test]
    fn test_everything_missing_uses_fallback() {
        let records = vec![profile(json!({
            "name": null,
            "email": "",
            "skills": [],
        }))];

        let result = analyze(&records, &settings());

        assert_eq!(result.categories.len(), 1);
        let category = &result.categories[0];
        assert_eq!(category.category, "Unknown Role");
        assert_eq!(category.quality_score, 0.0);
        assert_eq!(category.missing_percentage, 100.0);
        assert_eq!(category.field_breakdown.len(), 4);
    }

    #[test]
    fn test_absent_data_object_counts_as_empty() {
        let records = vec![Record(json!({"id": 7})), Record(json!("not an object"))];

        let result = analyze(&records, &settings());

        assert_eq!(result.categories[0].category, "Unknown Role");
        assert_eq!(result.categories[0].count, 2);
        assert!(result.fields.iter().all(|f| f.missing == 2 && f.total == 2));
    }

    #[test]
    fn test_zero_and_false_are_not_missing() {
        let records = vec![profile(json!({
            "name": 0,
            "email": false,
            "skills": {},
            "current_role": "Analyst",
        }))];

        let result = analyze(&records, &settings());

        assert!(result.fields.iter().all(|f| f.missing == 0));
        assert_eq!(result.categories[0].quality_score, 100.0);
    }

    #[test]
    fn test_falsy_category_values_use_fallback() {
        let records = vec![
            profile(json!({"current_role": ""})),
            profile(json!({"current_role": false})),
            profile(json!({"current_role": 0})),
            profile(json!({"current_role": []})),
        ];

        let result = analyze(&records, &settings());

        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[0].category, "Unknown Role");
        assert_eq!(result.categories[0].count, 4);
    }

    #[test]
    fn test_non_string_category_is_rendered_as_json() {
        let records = vec![profile(json!({"current_role": 42}))];
        let result = analyze(&records, &settings());
        assert_eq!(result.categories[0].category, "42");
    }

    #[test]
    fn test_percentages_and_rounding() {
        // 3 records, 4 fields: Engineer has 1 of 8 values missing (12.5%).
        let records = vec![
            profile(json!({"name": "A", "email": "a@x", "skills": ["x"], "current_role": "Engineer"})),
            profile(json!({"name": "B", "email": "", "skills": ["y"], "current_role": "Engineer"})),
            profile(json!({"name": "C", "email": "", "skills": [], "current_role": "Designer"})),
        ];

        let result = analyze(&records, &settings());

        let engineer = &result.categories[0];
        assert_eq!(engineer.category, "Engineer");
        assert_eq!(engineer.missing_percentage, 12.5);
        assert_eq!(engineer.quality_score, 87.5);

        let designer = &result.categories[1];
        assert_eq!(designer.missing_percentage, 50.0);
        assert_eq!(designer.quality_score, 50.0);

        let email = &result.fields[0];
        assert_eq!(email.field, "email");
        assert_eq!(email.missing, 2);
        assert_eq!(email.total, 3);
        assert_eq!(email.missing_percentage, 66.7);

        let skills = &result.fields[1];
        assert_eq!(skills.field, "skills");
        assert_eq!(skills.missing_percentage, 33.3);
    }

    #[test]
    fn test_quality_plus_missing_is_hundred() {
        let records: Vec<Record> = (0..7)
            .map(|i| {
                profile(json!({
                    "name": if i % 2 == 0 { json!("x") } else { json!(null) },
                    "email": if i % 3 == 0 { json!("") } else { json!("e") },
                    "current_role": if i < 4 { "Ops" } else { "Sales" },
                }))
            })
            .collect();

        let result = analyze(&records, &settings());

        for category in &result.categories {
            let sum = category.quality_score + category.missing_percentage;
            assert!((sum - 100.0).abs() <= 0.1, "{} sums to {}", category.category, sum);
            assert!((0.0..=100.0).contains(&category.missing_percentage));
        }
        assert_eq!(result.total_records(), 7);
    }

    #[test]
    fn test_ties_preserve_encounter_order() {
        let records = vec![
            profile(json!({"current_role": "Zeta", "name": "a", "email": "b", "skills": ["c"]})),
            profile(json!({"current_role": "Alpha", "name": "a", "email": "b", "skills": ["c"]})),
            profile(json!({"current_role": "Alpha", "name": "a", "email": "b", "skills": ["c"]})),
            profile(json!({"current_role": "Mid", "name": "a", "email": "b", "skills": ["c"]})),
        ];

        let result = analyze(&records, &settings());
        let order: Vec<&str> = result.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, vec!["Alpha", "Zeta", "Mid"]);

        // No field is missing, so fields keep their configured order.
        let fields: Vec<&str> = result.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "skills", "current_role"]);
    }

    #[test]
    fn test_field_summaries_sorted_descending() {
        let records = vec![
            profile(json!({"name": "a", "current_role": "R"})),
            profile(json!({"name": "a", "email": "e", "current_role": "R"})),
        ];

        let result = analyze(&records, &settings());
        let percentages: Vec<f64> = result.fields.iter().map(|f| f.missing_percentage).collect();
        let mut sorted = percentages.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(percentages, sorted);
        assert_eq!(result.fields[0].field, "skills");
    }

    #[test]
    fn test_fixture_profiles() {
        let records: Vec<Record> =
            serde_json::from_str(include_str!("../../fixtures/profiles.json")).unwrap();
        let settings = AnalysisSettings {
            fields: crate::config::AnalysisConfig::default().fields,
            ..settings()
        };

        let result = analyze(&records, &settings);

        let categories: Vec<(&str, usize, f64)> = result
            .categories
            .iter()
            .map(|c| (c.category.as_str(), c.count, c.quality_score))
            .collect();
        assert_eq!(
            categories,
            vec![
                ("Unknown Role", 3, 21.2),
                ("Software Engineer", 2, 81.8),
                ("Product Designer", 1, 90.9),
            ]
        );

        let top: Vec<&str> = result.fields.iter().take(6).map(|f| f.field.as_str()).collect();
        assert_eq!(
            top,
            vec!["phone", "summary", "current_company", "email", "skills", "current_role"]
        );
        assert_eq!(result.fields[0].missing_percentage, 66.7);
        assert_eq!(result.fields[3].missing_percentage, 50.0);
        assert_eq!(result.fields[10].missing_percentage, 33.3);
    }

    #[test]
    fn test_empty_input() {
        let result = analyze(&[], &settings());
        assert!(result.categories.is_empty());
        assert_eq!(result.fields.len(), 4);
        assert!(result.fields.iter().all(|f| f.total == 0 && f.missing_percentage == 0.0));
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(0.0), 0.0);
        assert_eq!(round1(12.5), 12.5);
        assert_eq!(round1(6.25), 6.2);
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(59.949999999999996), 59.9);
    }

    #[test]
    fn test_rounding_does_not_cross_tier_boundary() {
        let quality = round1(100.0 - 8811.0 / 22000.0 * 100.0);
        assert_eq!(quality, 59.9);
        assert_eq!(QualityTier::for_quality_score(quality), QualityTier::Bad);
    }

    #[test]
    fn test_field_percentage_ties_round_to_even() {
        let mut records: Vec<Record> = (0..15)
            .map(|_| profile(json!({"name": "a", "email": "b", "skills": ["c"], "current_role": "R"})))
            .collect();
        records.push(profile(json!({"email": "b", "skills": ["c"], "current_role": "R"})));

        let result = analyze(&records, &settings());

        let name = result.fields.iter().find(|f| f.field == "name").unwrap();
        assert_eq!(name.missing, 1);
        assert_eq!(name.missing_percentage, 6.2);
    }
}
