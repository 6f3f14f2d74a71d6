//! Source column names used by the asset export.

/// Unique asset tag; also the mapping key.
pub const TAG: &str = "FULL UNIQUE ASSET TAG";

/// Tag type.
pub const TAG_TYPE: &str = "Tag Type";

/// Quantity.
pub const QUANTITY: &str = "Qty.";

/// Portfolio name.
pub const PORTFOLIO_NAME: &str = "Portfolio Name";

/// District name.
pub const DISTRICT_NAME: &str = "District Name";

/// Building name.
pub const BUILDING_NAME: &str = "Building Name";

/// Building area.
pub const BUILDING_AREA: &str = "Building Area";

/// Floor name.
pub const FLOOR_NAME: &str = "Floor Name";

/// Asset type name.
pub const ASSET_TYPE_NAME: &str = "Asset Type Name";

/// Description.
pub const DESCRIPTION: &str = "Description";

/// Country of origin.
pub const COUNTRY_OF_ORIGIN: &str = "Country of Origin";

/// System name, in order of preference. Some exports carry a trailing space
/// in the header.
pub const SYSTEM_NAME: [&str; 2] = ["System Name ", "System Name"];
