//! Camera-based QR scanning.
//!
//! A scan session acquires the camera through a [`QrDecoder`], waits for the
//! first decoded payload, stops, and hands the payload to the lookup
//! service:
//!
//! ```text
//! Idle -> Starting -> Active -> Idle
//!            |                   ^
//!            +--- camera error --+
//! ```
//!
//! Decoder noise (frames with no readable code) is discarded. Stopping is
//! idempotent, and teardown errors are logged rather than surfaced.

mod command;
mod controller;
mod decoder;

pub use command::CommandDecoder;
pub use controller::{ScanController, ScanEnd, ScanHandle, ScanOutcome, ScanState};
pub use decoder::{
    CameraConstraints, DecodeEvent, DecoderConfig, DecoderError, DecoderFactory, QrDecoder,
};
