//! Row-to-record normalization.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::columns;
use crate::config::ConverterConfig;
use crate::error::{Error, Result};
use crate::record::{quantity, text, AssetMap, AssetRecord};

/// Options controlling how an export is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Property that may wrap the row array.
    pub wrapper_property: String,
    /// Reserved prefix for synthesized keys.
    pub placeholder_prefix: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from(&ConverterConfig::default())
    }
}

impl From<&ConverterConfig> for NormalizeOptions {
    fn from(config: &ConverterConfig) -> Self {
        Self {
            wrapper_property: config.wrapper_property.clone(),
            placeholder_prefix: config.placeholder_prefix.clone(),
        }
    }
}

/// Counters describing a normalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Rows read from the export.
    pub rows: usize,
    /// Rows keyed by a synthesized placeholder.
    pub synthesized_keys: usize,
    /// Rows whose tag repeated an earlier row's tag.
    pub duplicate_tags: usize,
    /// Real tags that start with the reserved placeholder prefix.
    pub reserved_prefix_tags: usize,
}

/// Result of a successful normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// The keyed records, in row order.
    pub records: AssetMap,
    /// Run counters.
    pub report: NormalizeReport,
}

/// Converts raw export rows into an [`AssetMap`].
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    /// Create a normalizer with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer with custom options.
    #[must_use]
    pub fn with_options(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    #[must_use]
    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalize a raw export value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if `input` is neither an array of rows nor an
    /// object holding one under the wrapper property. Individual rows never
    /// cause an error.
    pub fn normalize(&self, input: &Value) -> Result<Normalized> {
        let rows = self.rows(input)?;
        let tags: Vec<Option<String>> = rows
            .iter()
            .map(|row| text(as_object(row).and_then(|r| r.get(columns::TAG))))
            .collect();

        let prefix = self.options.placeholder_prefix.as_str();
        let real_tags: HashSet<&str> = tags.iter().flatten().map(String::as_str).collect();

        let mut report = NormalizeReport {
            rows: rows.len(),
            ..NormalizeReport::default()
        };
        for tag in real_tags.iter().filter(|tag| tag.starts_with(prefix)) {
            report.reserved_prefix_tags += 1;
            warn!(tag = %tag, prefix = %prefix, "Asset tag uses the reserved placeholder prefix");
        }

        let mut records = AssetMap::with_capacity(rows.len());
        for (index, (row, tag)) in rows.iter().zip(&tags).enumerate() {
            let key = match tag {
                Some(tag) => tag.clone(),
                None => {
                    report.synthesized_keys += 1;
                    placeholder_key(prefix, index, &real_tags)
                }
            };

            let record = to_record(row, tag.clone());
            if records.insert(key.clone(), record).is_some() {
                report.duplicate_tags += 1;
                warn!(key = %key, row = index, "Duplicate asset tag, later row replaces earlier");
            }
        }

        debug!(
            rows = report.rows,
            records = records.len(),
            synthesized = report.synthesized_keys,
            "Normalized export"
        );
        Ok(Normalized { records, report })
    }

    fn rows<'a>(&self, input: &'a Value) -> Result<&'a [Value]> {
        let rows = match input {
            Value::Array(rows) => Some(rows),
            Value::Object(obj) => match obj.get(&self.options.wrapper_property) {
                Some(Value::Array(rows)) => Some(rows),
                _ => None,
            },
            _ => None,
        };
        rows.map(Vec::as_slice)
            .ok_or_else(|| Error::format("expected an array of records"))
    }
}

/// Normalize with default options, returning only the mapping.
///
/// # Errors
///
/// Returns [`Error::Format`] when `input` does not hold an array of rows.
pub fn normalize(input: &Value) -> Result<AssetMap> {
    Normalizer::new().normalize(input).map(|n| n.records)
}

fn placeholder_key(prefix: &str, index: usize, real_tags: &HashSet<&str>) -> String {
    let base = format!("{prefix}{index}");
    if !real_tags.contains(base.as_str()) {
        return base;
    }
    let key = (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !real_tags.contains(candidate.as_str()))
        .unwrap_or_default();
    warn!(placeholder = %base, key = %key, "Placeholder collided with a real tag");
    key
}

fn as_object(row: &Value) -> Option<&Map<String, Value>> {
    let obj = row.as_object();
    if obj.is_none() {
        debug!("Row is not an object, treating all columns as missing");
    }
    obj
}

fn to_record(row: &Value, tag: Option<String>) -> AssetRecord {
    let Some(row) = row.as_object() else {
        return AssetRecord::default();
    };
    let col = |name: &str| text(row.get(name));

    AssetRecord {
        full_unique_asset_tag: tag,
        tag_type: col(columns::TAG_TYPE),
        quantity: quantity(row.get(columns::QUANTITY)),
        portfolio_name: col(columns::PORTFOLIO_NAME),
        district_name: col(columns::DISTRICT_NAME),
        building_name: col(columns::BUILDING_NAME),
        building_area: col(columns::BUILDING_AREA),
        floor_name: col(columns::FLOOR_NAME),
        asset_type_name: col(columns::ASSET_TYPE_NAME),
        description: col(columns::DESCRIPTION),
        country_of_origin: col(columns::COUNTRY_OF_ORIGIN),
        system_name: columns::SYSTEM_NAME.iter().find_map(|name| col(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_row() -> Value {
        json!({
            "FULL UNIQUE ASSET TAG": "  HQ-AHU-001 ",
            "Tag Type": "QR",
            "Qty.": 2,
            "Portfolio Name": "North",
            "District Name": "Central",
            "Building Name": "Tower A",
            "Building Area": "Plant Room",
            "Floor Name": "Roof",
            "Asset Type Name": "Air Handling Unit",
            "Description": "AHU serving levels 1-10",
            "Country of Origin": "Germany",
            "System Name ": "HVAC"
        })
    }

    #[test]
    fn test_example_row() {
        let map = normalize(&json!([{"FULL UNIQUE ASSET TAG": "AB-100", "Qty.": 5}])).unwrap();

        assert_eq!(map.len(), 1);
        let record = map.get("AB-100").unwrap();
        assert_eq!(
            record,
            &AssetRecord {
                quantity: 5,
                ..AssetRecord::with_tag("AB-100")
            }
        );
    }

    #[test]
    fn test_full_row_is_trimmed() {
        let map = normalize(&json!([full_row()])).unwrap();
        let record = map.get("HQ-AHU-001").unwrap();

        assert_eq!(record.tag(), Some("HQ-AHU-001"));
        assert_eq!(record.tag_type.as_deref(), Some("QR"));
        assert_eq!(record.quantity, 2);
        assert_eq!(record.portfolio_name.as_deref(), Some("North"));
        assert_eq!(record.district_name.as_deref(), Some("Central"));
        assert_eq!(record.building_name.as_deref(), Some("Tower A"));
        assert_eq!(record.building_area.as_deref(), Some("Plant Room"));
        assert_eq!(record.floor_name.as_deref(), Some("Roof"));
        assert_eq!(record.asset_type_name.as_deref(), Some("Air Handling Unit"));
        assert_eq!(record.description.as_deref(), Some("AHU serving levels 1-10"));
        assert_eq!(record.country_of_origin.as_deref(), Some("Germany"));
        assert_eq!(record.system_name.as_deref(), Some("HVAC"));
    }

    #[test]
    fn test_empty_row_defaults() {
        let map = normalize(&json!([{}])).unwrap();
        let (key, record) = map.iter().next().unwrap();

        assert_eq!(key, "ASSET-0");
        assert_eq!(record, &AssetRecord::default());
    }

    #[test]
    fn test_wrapped_input() {
        let map = normalize(&json!({"Sheet1": [{"FULL UNIQUE ASSET TAG": "X"}]})).unwrap();
        assert!(map.contains_key("X"));
    }

    #[test]
    fn test_custom_wrapper_property() {
        let normalizer = Normalizer::with_options(NormalizeOptions {
            wrapper_property: "Assets".to_string(),
            placeholder_prefix: "ROW#".to_string(),
        });
        assert_eq!(normalizer.options().wrapper_property, "Assets");

        let normalized = normalizer.normalize(&json!({"Assets": [{}]})).unwrap();
        assert!(normalized.records.contains_key("ROW#0"));
    }

    #[test]
    fn test_non_array_input_fails() {
        for input in [
            json!({"Sheet2": []}),
            json!({"Sheet1": {"a": 1}}),
            json!("rows"),
            json!(42),
            Value::Null,
        ] {
            let err = normalize(&input).unwrap_err();
            assert!(err.is_format_error(), "{input} should fail");
            assert!(err.to_string().contains("expected an array of records"));
        }
    }

    #[test]
    fn test_untagged_rows_get_distinct_keys() {
        let normalized = Normalizer::new()
            .normalize(&json!([{"Qty.": 1}, {"FULL UNIQUE ASSET TAG": "T"}, {"Qty.": 2}]))
            .unwrap();

        let keys: Vec<&str> = normalized.records.keys().collect();
        assert_eq!(keys, vec!["ASSET-0", "T", "ASSET-2"]);
        assert_eq!(normalized.report.synthesized_keys, 2);
    }

    #[test]
    fn test_blank_tag_is_untagged() {
        let map = normalize(&json!([{"FULL UNIQUE ASSET TAG": "   "}])).unwrap();
        let (key, record) = map.iter().next().unwrap();
        assert_eq!(key, "ASSET-0");
        assert!(record.full_unique_asset_tag.is_none());
    }

    #[test]
    fn test_placeholder_avoids_real_tags() {
        let normalized = Normalizer::new()
            .normalize(&json!([
                {"Description": "untagged"},
                {"FULL UNIQUE ASSET TAG": "ASSET-0"},
                {"FULL UNIQUE ASSET TAG": "ASSET-0-1"}
            ]))
            .unwrap();

        let keys: Vec<&str> = normalized.records.keys().collect();
        assert_eq!(keys, vec!["ASSET-0-2", "ASSET-0", "ASSET-0-1"]);
        assert_eq!(normalized.report.reserved_prefix_tags, 2);
        assert_eq!(
            normalized.records.get("ASSET-0-2").unwrap().description.as_deref(),
            Some("untagged")
        );
    }

    #[test]
    fn test_duplicate_tag_replaces_in_place() {
        let normalized = Normalizer::new()
            .normalize(&json!([
                {"FULL UNIQUE ASSET TAG": "A", "Qty.": 1},
                {"FULL UNIQUE ASSET TAG": "B"},
                {"FULL UNIQUE ASSET TAG": "A", "Qty.": 7}
            ]))
            .unwrap();

        let keys: Vec<&str> = normalized.records.keys().collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(normalized.records.get("A").unwrap().quantity, 7);
        assert_eq!(normalized.report.duplicate_tags, 1);
        assert_eq!(normalized.report.rows, 3);
    }

    #[test]
    fn test_system_name_fallback() {
        let map = normalize(&json!([
            {"FULL UNIQUE ASSET TAG": "A", "System Name": " Fire "},
            {"FULL UNIQUE ASSET TAG": "B", "System Name ": "  ", "System Name": "Power"},
            {"FULL UNIQUE ASSET TAG": "C", "System Name ": "Water", "System Name": "Power"}
        ]))
        .unwrap();

        assert_eq!(map.get("A").unwrap().system_name.as_deref(), Some("Fire"));
        assert_eq!(map.get("B").unwrap().system_name.as_deref(), Some("Power"));
        assert_eq!(map.get("C").unwrap().system_name.as_deref(), Some("Water"));
    }

    #[test]
    fn test_non_object_row_is_tolerated() {
        let map = normalize(&json!([null, 7, "x"])).unwrap();
        assert_eq!(map.len(), 3);
        assert!(map.iter().all(|(_, r)| *r == AssetRecord::default()));
    }

    #[test]
    fn test_extreme_quantities_keep_totals_finite() {
        let map = normalize(&json!([
            {"FULL UNIQUE ASSET TAG": "A", "Qty.": 9_223_372_036_854_775_807_i64},
            {"FULL UNIQUE ASSET TAG": "B", "Qty.": 1},
            {"FULL UNIQUE ASSET TAG": "C", "Qty.": 1e300}
        ]))
        .unwrap();

        assert_eq!(map.get("C").unwrap().quantity, i64::MAX);
        assert_eq!(map.stats().total_quantity, i64::MAX);
    }
}
