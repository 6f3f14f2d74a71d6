//! Flattening of spreadsheet-style asset exports.
//!
//! The export is an array of loosely-typed rows whose keys are spreadsheet
//! headers (`FULL UNIQUE ASSET TAG`, `Qty.`, ...), optionally wrapped in a
//! named property such as `Sheet1`. Normalization maps every row onto the
//! fixed [`AssetRecord`](crate::AssetRecord) field set and keys the result by
//! asset tag.
//!
//! - Rows without a tag get a synthesized key built from a reserved prefix
//!   and the row position, guaranteed not to collide with any real tag.
//! - Missing or empty columns become `null`; a missing quantity becomes `0`.
//! - The conversion is all-or-nothing: a structural problem fails the whole
//!   run, while individual rows never do.
//!
//! # Example
//!
//! ```
//! use assetscan::normalize::Normalizer;
//!
//! let raw = serde_json::json!({
//!     "Sheet1": [{"FULL UNIQUE ASSET TAG": "AB-100", "Qty.": 5}]
//! });
//!
//! let normalized = Normalizer::new().normalize(&raw).unwrap();
//! let record = normalized.records.get("AB-100").unwrap();
//! assert_eq!(record.quantity, 5);
//! assert!(record.tag_type.is_none());
//! ```

pub mod columns;
mod normalizer;

pub use normalizer::{normalize, NormalizeOptions, NormalizeReport, Normalized, Normalizer};
