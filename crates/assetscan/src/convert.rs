//! File-level export conversion.
//!
//! Reads a raw export, normalizes it, and writes the keyed mapping. The
//! output is staged in a sibling temporary file and renamed into place, so a
//! failed run never leaves a partial output behind.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::normalize::Normalizer;
use crate::record::AssetStats;

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// The export that was read.
    pub input: PathBuf,
    /// The mapping that was written.
    pub output: PathBuf,
    /// Rows in the export.
    pub rows: usize,
    /// Records written.
    pub records: usize,
    /// Records keyed by a synthesized placeholder.
    pub synthesized_keys: usize,
    /// Rows whose tag repeated an earlier row's tag.
    pub duplicate_tags: usize,
    /// Totals over the written mapping.
    pub stats: AssetStats,
}

/// Convert the export at `input` into a mapping at `output`.
///
/// # Errors
///
/// Returns [`Error::Read`] if the input cannot be read, [`Error::Format`] if
/// it is not JSON or not an array of rows, and [`Error::Write`] if the output
/// cannot be written. Nothing is written unless every step before it
/// succeeded.
pub fn convert_file(
    input: &Path,
    output: &Path,
    normalizer: &Normalizer,
    pretty: bool,
) -> Result<ConversionSummary> {
    debug!(
        wrapper = %normalizer.options().wrapper_property,
        prefix = %normalizer.options().placeholder_prefix,
        "Reading export from {}",
        input.display()
    );
    let raw = std::fs::read_to_string(input).map_err(|source| Error::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| Error::format(format!("{} is not valid JSON: {e}", input.display())))?;

    let normalized = normalizer.normalize(&value)?;

    let bytes = if pretty {
        serde_json::to_vec_pretty(&normalized.records)?
    } else {
        serde_json::to_vec(&normalized.records)?
    };
    write_atomically(output, &bytes)?;

    let summary = ConversionSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        rows: normalized.report.rows,
        records: normalized.records.len(),
        synthesized_keys: normalized.report.synthesized_keys,
        duplicate_tags: normalized.report.duplicate_tags,
        stats: normalized.records.stats(),
    };

    info!(
        records = summary.records,
        total_quantity = summary.stats.total_quantity,
        "Conversion complete, wrote {}",
        output.display()
    );
    Ok(summary)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let staging = staging_path(path);
    let staged = std::fs::write(&staging, bytes).and_then(|()| std::fs::rename(&staging, path));
    if let Err(source) = staged {
        // Never leave a partial staging file behind
        let _ = std::fs::remove_file(&staging);
        return Err(write_err(source));
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("output"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}
