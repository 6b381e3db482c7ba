//! # Config Loader
//!
//! Tuning profile loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON tuning profiles
//! - Validate field ranges and cross-field rules
//! - Produce an `SaEngineConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("tuning.toml")).unwrap();
//! println!("hysteresis: {}", config.slots.hysteresis_factor);
//! ```

mod parser;
mod validator;

pub use contracts::SaEngineConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Tuning profile loader
///
/// Provides static methods to load a profile from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a tuning profile from a file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<SaEngineConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a tuning profile from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SaEngineConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already constructed profile
    pub fn validate(config: &SaEngineConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize a profile to a TOML string
    pub fn to_toml(config: &SaEngineConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a profile to a JSON string
    pub fn to_json(config: &SaEngineConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer the format from the file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SaEngineConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
