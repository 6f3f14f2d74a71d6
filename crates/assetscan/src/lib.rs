//! `assetscan` - Building asset lookup by tag or QR code
//!
//! This library converts spreadsheet exports of building assets into a keyed
//! asset database, looks assets up by typed tag or by scanned QR payload,
//! and drives the camera session that produces those payloads.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod normalize;
pub mod present;
pub mod record;
pub mod scan;
pub mod session;

pub use config::Config;
pub use convert::{convert_file, ConversionSummary};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use lookup::{Catalog, LookupService, Match, MatchTier};
pub use normalize::{normalize, Normalizer};
pub use record::{AssetMap, AssetRecord, AssetStats};
pub use scan::{CommandDecoder, ScanController, ScanHandle};
pub use session::{Session, Shown, UiState};
