//! Configuration management for assetscan.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration directory name.
const CONFIG_DIR_NAME: &str = "assetscan";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "ASSETSCAN_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ASSETSCAN_`, sections split on `__`)
/// 2. TOML config file at `~/.config/assetscan/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Export conversion settings.
    pub converter: ConverterConfig,
    /// Lookup session settings.
    pub lookup: LookupConfig,
    /// Camera scanning settings.
    pub scanner: ScannerConfig,
}

/// Settings for the offline export converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Raw export read when no input path is given.
    pub input_path: PathBuf,
    /// Normalized mapping written when no output path is given.
    pub output_path: PathBuf,
    /// Property that may wrap the row array in the export.
    pub wrapper_property: String,
    /// Reserved prefix for keys synthesized for untagged rows.
    pub placeholder_prefix: String,
    /// Pretty-print the output mapping.
    pub pretty: bool,
}

/// Settings for the lookup session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Normalized mapping loaded at startup.
    pub data_path: PathBuf,
    /// Delay before a lookup result is shown, in milliseconds.
    pub result_delay_ms: u64,
    /// How long an error notice stays visible, in milliseconds.
    pub notice_timeout_ms: u64,
}

/// Settings for the camera scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// External decoder command and its arguments.
    pub command: Vec<String>,
    /// Preferred camera (`environment` or `user`).
    pub facing_mode: String,
    /// Frames decoded per second.
    pub fps: u32,
    /// Width of the scan region in pixels.
    pub qrbox_width: u32,
    /// Height of the scan region in pixels.
    pub qrbox_height: u32,
    /// Aspect ratio of the video feed.
    pub aspect_ratio: f64,
    /// Capacity of the decoder event channel.
    pub event_buffer: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("JSON-FILE.json"),
            output_path: PathBuf::from("assets.json"),
            wrapper_property: "Sheet1".to_string(),
            placeholder_prefix: "ASSET-".to_string(),
            pretty: true,
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("assets.json"),
            result_delay_ms: 300,
            notice_timeout_ms: 5000,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "zbarcam".to_string(),
                "--raw".to_string(),
                "--nodisplay".to_string(),
            ],
            facing_mode: "environment".to_string(),
            fps: 10,
            qrbox_width: 250,
            qrbox_height: 250,
            aspect_ratio: 1.0,
            event_buffer: 32,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.converter.placeholder_prefix.is_empty() {
            return Err(invalid("placeholder_prefix must not be empty"));
        }

        if self.converter.wrapper_property.is_empty() {
            return Err(invalid("wrapper_property must not be empty"));
        }

        if self.scanner.command.first().map_or(true, String::is_empty) {
            return Err(invalid("scanner command must name a program"));
        }

        if self.scanner.fps == 0 {
            return Err(invalid("fps must be greater than 0"));
        }

        if self.scanner.qrbox_width == 0 || self.scanner.qrbox_height == 0 {
            return Err(invalid("qrbox dimensions must be greater than 0"));
        }

        if !self.scanner.aspect_ratio.is_finite() || self.scanner.aspect_ratio <= 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "aspect_ratio must be a positive number, got {}",
                    self.scanner.aspect_ratio
                ),
            });
        }

        if self.scanner.event_buffer == 0 {
            return Err(invalid("event_buffer must be greater than 0"));
        }

        Ok(())
    }

    /// Get the result delay as a Duration.
    #[must_use]
    pub fn result_delay(&self) -> Duration {
        Duration::from_millis(self.lookup.result_delay_ms)
    }

    /// Get the notice timeout as a Duration.
    #[must_use]
    pub fn notice_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup.notice_timeout_ms)
    }
}

fn invalid(message: &str) -> Error {
    Error::ConfigValidation {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.converter.input_path, PathBuf::from("JSON-FILE.json"));
        assert_eq!(config.converter.output_path, PathBuf::from("assets.json"));
        assert_eq!(config.converter.wrapper_property, "Sheet1");
        assert_eq!(config.lookup.data_path, PathBuf::from("assets.json"));
    }

    #[test]
    fn test_default_scanner_config() {
        let scanner = ScannerConfig::default();

        assert_eq!(scanner.command[0], "zbarcam");
        assert_eq!(scanner.facing_mode, "environment");
        assert_eq!(scanner.fps, 10);
        assert_eq!(scanner.qrbox_width, 250);
        assert_eq!(scanner.qrbox_height, 250);
        assert!((scanner.aspect_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_placeholder_prefix() {
        let mut config = Config::default();
        config.converter.placeholder_prefix = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("placeholder_prefix"));
    }

    #[test]
    fn test_validate_empty_command() {
        let mut config = Config::default();
        config.scanner.command = Vec::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("scanner command"));
    }

    #[test]
    fn test_validate_zero_fps() {
        let mut config = Config::default();
        config.scanner.fps = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("fps"));
    }

    #[test]
    fn test_validate_bad_aspect_ratio() {
        let mut config = Config::default();
        config.scanner.aspect_ratio = f64::NAN;
        assert!(config.validate().is_err());

        config.scanner.aspect_ratio = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.result_delay(), Duration::from_millis(300));
        assert_eq!(config.notice_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("assetscan"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_toml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[lookup]\nresult_delay_ms = 0\n\n[converter]\nwrapper_property = \"Assets\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.lookup.result_delay_ms, 0);
        assert_eq!(config.converter.wrapper_property, "Assets");
        assert_eq!(config.lookup.notice_timeout_ms, 5000);
    }

    #[test]
    fn test_load_invalid_toml_value_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scanner]\nfps = 0\n").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("placeholder_prefix"));
        assert!(json.contains("result_delay_ms"));
    }
}
