//! Asset record types for assetscan.
//!
//! An [`AssetRecord`] is one normalized row of the asset export. Records are
//! held in an [`AssetMap`], which keeps keys unique and remembers insertion
//! order so that "first match" lookups are reproducible from the row order
//! of the original export.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One physical or logical asset entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetRecord {
    /// The unique asset tag, if the source row had one.
    #[serde(deserialize_with = "loose_text")]
    pub full_unique_asset_tag: Option<String>,
    /// Kind of physical tag (QR, barcode, plate, ...).
    #[serde(deserialize_with = "loose_text")]
    pub tag_type: Option<String>,
    /// Number of units; zero when the source row had none.
    #[serde(deserialize_with = "loose_quantity")]
    pub quantity: i64,
    /// Portfolio the asset belongs to.
    #[serde(deserialize_with = "loose_text")]
    pub portfolio_name: Option<String>,
    /// District the asset is located in.
    #[serde(deserialize_with = "loose_text")]
    pub district_name: Option<String>,
    /// Building the asset is located in.
    #[serde(deserialize_with = "loose_text")]
    pub building_name: Option<String>,
    /// Area within the building.
    #[serde(deserialize_with = "loose_text")]
    pub building_area: Option<String>,
    /// Floor within the building.
    #[serde(deserialize_with = "loose_text")]
    pub floor_name: Option<String>,
    /// Asset type.
    #[serde(deserialize_with = "loose_text")]
    pub asset_type_name: Option<String>,
    /// Free-form description.
    #[serde(deserialize_with = "loose_text")]
    pub description: Option<String>,
    /// Country the asset was manufactured in.
    #[serde(deserialize_with = "loose_text")]
    pub country_of_origin: Option<String>,
    /// System the asset is part of.
    #[serde(deserialize_with = "loose_text")]
    pub system_name: Option<String>,
}

fn loose_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|value| text(value.as_ref()))
}

fn loose_quantity<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|value| quantity(value.as_ref()))
}

/// Coerce a cell to trimmed text; empty cells become `None`.
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce a cell to a whole quantity; anything unusable becomes `0`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn quantity(value: Option<&Value>) -> i64 {
    let whole = |f: f64| f.is_finite().then(|| f.trunc() as i64);
    match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    }
    .unwrap_or(0)
}

impl AssetRecord {
    /// Create a record carrying only a tag.
    #[must_use]
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            full_unique_asset_tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// The asset tag, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.full_unique_asset_tag.as_deref()
    }
}

/// Aggregate counts over a mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStats {
    /// Number of records.
    pub total_assets: usize,
    /// Sum of all record quantities.
    pub total_quantity: i64,
}

/// Insertion-ordered mapping from key to [`AssetRecord`].
///
/// Re-inserting an existing key replaces the record but keeps the key's
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMap {
    entries: Vec<(String, AssetRecord)>,
    index: HashMap<String, usize>,
}

impl AssetMap {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a record, returning the record it replaced.
    pub fn insert(&mut self, key: String, record: AssetRecord) -> Option<AssetRecord> {
        if let Some(&pos) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[pos].1, record));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, record));
        None
    }

    /// Look up a record by its exact key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AssetRecord> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Look up a key and its record by exact key.
    #[must_use]
    pub fn get_key_value(&self, key: &str) -> Option<(&str, &AssetRecord)> {
        self.index.get(key).map(|&pos| {
            let (k, r) = &self.entries[pos];
            (k.as_str(), r)
        })
    }

    /// Check whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the mapping has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssetRecord)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Compute record and quantity totals.
    #[must_use]
    pub fn stats(&self) -> AssetStats {
        AssetStats {
            total_assets: self.entries.len(),
            total_quantity: self
                .entries
                .iter()
                .fold(0i64, |total, (_, r)| total.saturating_add(r.quantity)),
        }
    }
}

impl IntoIterator for AssetMap {
    type Item = (String, AssetRecord);
    type IntoIter = std::vec::IntoIter<(String, AssetRecord)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, AssetRecord)> for AssetMap {
    fn from_iter<I: IntoIterator<Item = (String, AssetRecord)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, record) in iter {
            map.insert(key, record);
        }
        map
    }
}

impl Serialize for AssetMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for AssetMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AssetMapVisitor;

        impl<'de> Visitor<'de> for AssetMapVisitor {
            type Value = AssetMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping asset keys to records")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<AssetMap, A::Error> {
                let mut map = AssetMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, record)) = access.next_entry::<String, AssetRecord>()? {
                    map.insert(key, record);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(AssetMapVisitor)
    }
}
