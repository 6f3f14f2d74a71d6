//! Asset lookup over the in-memory mapping.
//!
//! Queries are matched in four tiers; the first tier that matches wins:
//!
//! 1. exact key, case-sensitive
//! 2. key, ignoring case
//! 3. the record's asset tag, ignoring case
//! 4. the query as a substring of the key or the asset tag, ignoring case
//!
//! Within tiers 2 to 4 the first record in mapping order wins. Matching is
//! purely textual: separators are not normalized and there is no fuzzy
//! matching.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{AssetMap, AssetRecord, AssetStats};

/// The tier a query matched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// The query equals a key.
    ExactKey,
    /// The query equals a key, ignoring case.
    KeyIgnoreCase,
    /// The query equals a record's asset tag, ignoring case.
    TagValue,
    /// The query occurs inside a key or asset tag, ignoring case.
    Substring,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactKey => write!(f, "exact_key"),
            Self::KeyIgnoreCase => write!(f, "key_ignore_case"),
            Self::TagValue => write!(f, "tag_value"),
            Self::Substring => write!(f, "substring"),
        }
    }
}

/// A successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Match<'a> {
    /// Key of the matched record.
    pub key: &'a str,
    /// Tier the query matched in.
    pub tier: MatchTier,
    /// The matched record.
    pub record: &'a AssetRecord,
}

#[derive(Debug)]
struct Entry {
    key_upper: String,
    tag_upper: Option<String>,
}

/// Immutable, searchable view of an [`AssetMap`].
///
/// Uppercased keys and tags are computed once at construction.
#[derive(Debug)]
pub struct Catalog {
    records: AssetMap,
    entries: Vec<Entry>,
}

impl Catalog {
    /// Build a catalog over `records`.
    #[must_use]
    pub fn new(records: AssetMap) -> Self {
        let entries = records
            .iter()
            .map(|(key, record)| Entry {
                key_upper: key.to_uppercase(),
                tag_upper: record.tag().map(str::to_uppercase),
            })
            .collect();
        Self { records, entries }
    }

    /// Load a normalized mapping file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::load(path, e))?;
        let records: AssetMap = serde_json::from_str(&raw).map_err(|e| Error::load(path, e))?;
        info!(assets = records.len(), "Loaded asset database from {}", path.display());
        Ok(Self::new(records))
    }

    /// The underlying mapping.
    #[must_use]
    pub fn records(&self) -> &AssetMap {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record and quantity totals.
    #[must_use]
    pub fn stats(&self) -> AssetStats {
        self.records.stats()
    }

    /// Find the record matching `query`.
    #[must_use]
    pub fn find(&self, query: &str) -> Option<Match<'_>> {
        if let Some((key, record)) = self.records.get_key_value(query) {
            return Some(Match {
                key,
                tier: MatchTier::ExactKey,
                record,
            });
        }

        let upper = query.to_uppercase();
        self.first(MatchTier::KeyIgnoreCase, |e| e.key_upper == upper)
            .or_else(|| {
                self.first(MatchTier::TagValue, |e| {
                    e.tag_upper.as_deref() == Some(upper.as_str())
                })
            })
            .or_else(|| {
                self.first(MatchTier::Substring, |e| {
                    e.key_upper.contains(&upper)
                        || e.tag_upper.as_ref().is_some_and(|t| t.contains(&upper))
                })
            })
    }

    fn first(&self, tier: MatchTier, pred: impl Fn(&Entry) -> bool) -> Option<Match<'_>> {
        self.entries
            .iter()
            .zip(self.records.iter())
            .find(|pair| pred(pair.0))
            .map(|(_, (key, record))| Match { key, tier, record })
    }
}

impl From<AssetMap> for Catalog {
    fn from(records: AssetMap) -> Self {
        Self::new(records)
    }
}

/// Session-scoped lookup service.
///
/// The mapping is installed once with [`initialize`](Self::initialize) and is
/// read-only afterwards. Until then every query is not-found.
#[derive(Debug, Default)]
pub struct LookupService {
    catalog: OnceLock<Catalog>,
}

impl LookupService {
    /// Create an uninitialized service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the session's mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] if a mapping is already installed.
    pub fn initialize(&self, records: impl Into<Catalog>) -> Result<()> {
        self.catalog
            .set(records.into())
            .map_err(|_| Error::AlreadyInitialized)
    }

    /// Check whether a mapping has been installed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.catalog.get().is_some()
    }

    /// The installed catalog, if any.
    #[must_use]
    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.get()
    }

    /// Record and quantity totals; zero before initialization.
    #[must_use]
    pub fn stats(&self) -> AssetStats {
        self.catalog().map(Catalog::stats).unwrap_or_default()
    }

    /// Find the record matching `query`.
    #[must_use]
    pub fn find(&self, query: &str) -> Option<Match<'_>> {
        let Some(catalog) = self.catalog.get() else {
            debug!("Lookup before the asset database was loaded");
            return None;
        };
        let found = catalog.find(query);
        match &found {
            Some(m) => debug!(query = %query, key = %m.key, tier = %m.tier, "Asset found"),
            None => debug!(query = %query, "Asset not found"),
        }
        found
    }

    /// Find just the record matching `query`.
    #[must_use]
    pub fn find_record(&self, query: &str) -> Option<&AssetRecord> {
        self.find(query).map(|m| m.record)
    }
}

/// Trim a user-entered query, rejecting empty input.
///
/// # Errors
///
/// Returns [`Error::Validation`] when `raw` is empty or whitespace-only.
pub fn validate_query(raw: &str) -> Result<&str> {
    let query = raw.trim();
    if query.is_empty() {
        Err(Error::Validation)
    } else {
        Ok(query)
    }
}
