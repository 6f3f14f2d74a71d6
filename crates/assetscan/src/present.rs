//! Terminal rendering of lookup results.

use std::fmt::Write as _;

use crate::record::{AssetRecord, AssetStats};

/// Shown in place of a missing value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Labelled display values for every field of `record`, in card order.
#[must_use]
pub fn detail_fields(record: &AssetRecord) -> Vec<(&'static str, String)> {
    let show = |value: &Option<String>| {
        value
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    vec![
        ("Asset Tag", show(&record.full_unique_asset_tag)),
        ("Tag Type", show(&record.tag_type)),
        ("Quantity", record.quantity.to_string()),
        ("Portfolio", show(&record.portfolio_name)),
        ("District", show(&record.district_name)),
        ("Building", show(&record.building_name)),
        ("Building Area", show(&record.building_area)),
        ("Floor", show(&record.floor_name)),
        ("Asset Type", show(&record.asset_type_name)),
        ("Description", show(&record.description)),
        ("Country of Origin", show(&record.country_of_origin)),
        ("System", show(&record.system_name)),
    ]
}

/// Render `record` as an aligned detail card.
#[must_use]
pub fn render_details(record: &AssetRecord) -> String {
    let fields = detail_fields(record);
    let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;

    let mut out = String::new();
    for (label, value) in fields {
        let _ = writeln!(out, "{:<width$} {value}", format!("{label}:"), width = width);
    }
    out
}

/// Render totals for display.
#[must_use]
pub fn render_stats(stats: &AssetStats) -> String {
    format!(
        "Total assets:   {}\nTotal quantity: {}\n",
        group_thousands(i64::try_from(stats.total_assets).unwrap_or(i64::MAX)),
        group_thousands(stats.total_quantity)
    )
}

/// Format an integer with comma thousands separators.
#[must_use]
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
