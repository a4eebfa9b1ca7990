//! Control core configuration.
//!
//! Loaded from JSON or YAML (chosen by file extension); every section is
//! optional and falls back to its defaults.

use std::path::Path;

use rckart_errors::ConfigError;
use rckart_input::{DEFAULT_TILT_LIMIT_DEG, RampConfig};
use rckart_link::LinkConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Current configuration schema identifier.
pub const SCHEMA_VERSION: &str = "kart.config/1";

/// Tilt steering tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    /// Tilt in degrees either side of level that maps to full lock.
    pub limit_deg: f32,
    /// Exponential smoothing weight of the newest sample, 1.0 = raw.
    pub smoothing: f32,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            limit_deg: DEFAULT_TILT_LIMIT_DEG,
            smoothing: 1.0,
        }
    }
}

impl TiltConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the limit is not in (0, 90] or the
    /// smoothing weight is not in (0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.limit_deg.is_finite() && self.limit_deg > 0.0 && self.limit_deg <= 90.0) {
            return Err(ConfigError::invalid(format!(
                "tilt.limit_deg must be in (0, 90], got {}",
                self.limit_deg
            )));
        }
        if !(self.smoothing.is_finite() && self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::invalid(format!(
                "tilt.smoothing must be in (0, 1], got {}",
                self.smoothing
            )));
        }
        Ok(())
    }
}

/// Full control core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Schema version
    pub schema_version: String,
    /// Vehicle identifiers and motor encoding
    pub link: LinkConfig,
    /// Throttle/brake ramp
    pub ramp: RampConfig,
    /// Tilt steering
    pub tilt: TiltConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            link: LinkConfig::default(),
            ramp: RampConfig::default(),
            tilt: TiltConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

impl ControlConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::invalid(format!(
                "unsupported schema_version {:?}, expected {SCHEMA_VERSION:?}",
                self.schema_version
            )));
        }
        self.link.validate()?;
        self.ramp.validate()?;
        self.tilt.validate()?;
        Ok(())
    }

    /// Parse a configuration from text in the format implied by `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text does not match the schema.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        match Format::of(path) {
            Format::Json => serde_json::from_str(content)
                .map_err(|err| ConfigError::parse(path, err.to_string())),
            Format::Yaml => serde_yaml::from_str(content)
                .map_err(|err| ConfigError::parse(path, err.to_string())),
        }
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, and parse or
    /// validation errors otherwise.
    pub async fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| ConfigError::io(path, err))?;
        let config = Self::parse(path, &content)?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Render the configuration in the format implied by `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn render(&self, path: &Path) -> Result<String, ConfigError> {
        match Format::of(path) {
            Format::Json => serde_json::to_string_pretty(self)
                .map_err(|err| ConfigError::parse(path, err.to_string())),
            Format::Yaml => {
                serde_yaml::to_string(self).map_err(|err| ConfigError::parse(path, err.to_string()))
            }
        }
    }

    /// Write the configuration, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be written.
    pub async fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| ConfigError::io(parent, err))?;
        }
        let content = self.render(path)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|err| ConfigError::io(path, err))?;
        debug!(path = %path.display(), "saved config");
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> ControlConfigBuilder {
        ControlConfigBuilder::default()
    }
}

/// Builder for `ControlConfig`.
#[derive(Debug, Default)]
pub struct ControlConfigBuilder {
    config: ControlConfig,
}

impl ControlConfigBuilder {
    /// Set the link section.
    #[must_use]
    pub fn link(mut self, link: LinkConfig) -> Self {
        self.config.link = link;
        self
    }

    /// Set the ramp section.
    #[must_use]
    pub fn ramp(mut self, ramp: RampConfig) -> Self {
        self.config.ramp = ramp;
        self
    }

    /// Set the full-lock tilt angle.
    #[must_use]
    pub fn tilt_limit_deg(mut self, degrees: f32) -> Self {
        self.config.tilt.limit_deg = degrees;
        self
    }

    /// Set the tilt smoothing weight.
    #[must_use]
    pub fn tilt_smoothing(mut self, alpha: f32) -> Self {
        self.config.tilt.smoothing = alpha;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<ControlConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rckart_input::ReleasePolicy;
    use rckart_protocol::MotorEncoding;

    #[test]
    fn test_default_is_valid() {
        assert!(ControlConfig::default().validate().is_ok());
    }

    #[test]
    fn test_format_by_extension() {
        assert_eq!(Format::of(Path::new("kart.yaml")), Format::Yaml);
        assert_eq!(Format::of(Path::new("kart.YML")), Format::Yaml);
        assert_eq!(Format::of(Path::new("kart.json")), Format::Json);
        assert_eq!(Format::of(Path::new("kart")), Format::Json);
    }

    #[test]
    fn test_parse_partial_yaml() -> Result<(), ConfigError> {
        let yaml = "ramp:\n  release_policy: hold_to_cruise\nlink:\n  motor_encoding: unsigned\n";
        let config = ControlConfig::parse(Path::new("kart.yaml"), yaml)?;
        assert_eq!(config.ramp.release_policy, ReleasePolicy::HoldToCruise);
        assert_eq!(config.link.motor_encoding, MotorEncoding::Unsigned);
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        Ok(())
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ControlConfig::parse(Path::new("kart.json"), "{ not json").err();
        assert!(matches!(err, Some(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_validation_messages() {
        let config = ControlConfig {
            schema_version: "kart.config/0".to_string(),
            ..ControlConfig::default()
        };
        insta::assert_snapshot!(
            config.validate().err().map(|e| e.to_string()).unwrap_or_default(),
            @r#"Invalid configuration: unsupported schema_version "kart.config/0", expected "kart.config/1""#
        );

        let err = ControlConfig::builder().tilt_limit_deg(0.0).build().err();
        insta::assert_snapshot!(
            err.map(|e| e.to_string()).unwrap_or_default(),
            @"Invalid configuration: tilt.limit_deg must be in (0, 90], got 0"
        );
    }

    #[test]
    fn test_builder_checks_nested_sections() {
        let ramp = RampConfig::builder().step(0).build_unchecked();
        assert!(ControlConfig::builder().ramp(ramp).build().is_err());
        assert!(ControlConfig::builder().tilt_smoothing(1.5).build().is_err());
        assert!(ControlConfig::builder().tilt_smoothing(0.3).build().is_ok());
    }
}
