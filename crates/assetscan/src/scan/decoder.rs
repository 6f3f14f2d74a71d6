//! The seam between the scan controller and a camera-backed QR decoder.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::ScannerConfig;

/// Errors reported by a decoder.
#[derive(Debug, Error)]
pub enum DecoderError {
    /// Camera access was refused.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    /// No usable camera or decoder backend.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// The decoder failed to start for another reason.
    #[error("failed to start decoder: {0}")]
    StartFailed(String),

    /// The decoder failed to release the camera cleanly.
    #[error("failed to stop decoder: {0}")]
    StopFailed(String),

    /// The decoder is already running.
    #[error("decoder already running")]
    AlreadyRunning,
}

/// Something the decoder observed on a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A payload was decoded.
    Decoded(String),
    /// A frame could not be decoded. Expected at high frequency.
    Noise(String),
}

/// Which camera to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConstraints {
    /// `environment` for the rear camera, `user` for the front.
    pub facing_mode: String,
}

/// Frame and region settings for the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Frames decoded per second.
    pub fps: u32,
    /// Scan region width in pixels.
    pub qrbox_width: u32,
    /// Scan region height in pixels.
    pub qrbox_height: u32,
    /// Aspect ratio of the video feed.
    pub aspect_ratio: f64,
}

impl From<&ScannerConfig> for CameraConstraints {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            facing_mode: config.facing_mode.clone(),
        }
    }
}

impl From<&ScannerConfig> for DecoderConfig {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            fps: config.fps,
            qrbox_width: config.qrbox_width,
            qrbox_height: config.qrbox_height,
            aspect_ratio: config.aspect_ratio,
        }
    }
}

/// A camera-based QR decoder.
///
/// Implementors must release the camera when dropped, so that an abandoned
/// session never keeps the device open.
#[async_trait::async_trait]
pub trait QrDecoder: Send {
    /// Name of this decoder (for logging).
    fn name(&self) -> &'static str;

    /// Open the camera and begin decoding, sending events through `events`.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera cannot be acquired or decoding cannot
    /// begin.
    async fn start(
        &mut self,
        constraints: &CameraConstraints,
        config: &DecoderConfig,
        events: mpsc::Sender<DecodeEvent>,
    ) -> Result<(), DecoderError>;

    /// Stop decoding and release the camera.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown did not complete cleanly.
    async fn stop(&mut self) -> Result<(), DecoderError>;

    /// Release any remaining presentation resources.
    fn clear(&mut self) {}
}

/// Creates a fresh decoder for each scan session.
pub trait DecoderFactory: Send {
    /// The decoder type produced.
    type Decoder: QrDecoder;

    /// Create a new, idle decoder.
    fn create(&self) -> Self::Decoder;
}

impl<F, D> DecoderFactory for F
where
    F: Fn() -> D + Send,
    D: QrDecoder,
{
    type Decoder = D;

    fn create(&self) -> D {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_error_display() {
        assert!(DecoderError::PermissionDenied("denied".to_string())
            .to_string()
            .contains("permission"));
        assert!(DecoderError::DeviceUnavailable("no device".to_string())
            .to_string()
            .contains("unavailable"));
        assert!(DecoderError::StartFailed("x".to_string())
            .to_string()
            .contains("start"));
        assert!(DecoderError::StopFailed("x".to_string())
            .to_string()
            .contains("stop"));
        assert!(DecoderError::AlreadyRunning
            .to_string()
            .contains("already running"));
    }

    #[test]
    fn test_settings_from_scanner_config() {
        let scanner = ScannerConfig::default();

        let constraints = CameraConstraints::from(&scanner);
        assert_eq!(constraints.facing_mode, "environment");

        let config = DecoderConfig::from(&scanner);
        assert_eq!(config.fps, 10);
        assert_eq!(config.qrbox_width, 250);
        assert_eq!(config.qrbox_height, 250);
    }
}
