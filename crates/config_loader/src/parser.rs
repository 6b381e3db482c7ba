//! Tuning profile parsing
//!
//! TOML is the primary format, JSON is accepted as well.

use contracts::{ContractError, SaEngineConfig};

/// Tuning profile format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a TOML tuning profile
pub fn parse_toml(content: &str) -> Result<SaEngineConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a JSON tuning profile
pub fn parse_json(content: &str) -> Result<SaEngineConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<SaEngineConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_partial_sections() {
        let content = r#"
[filter]
tau_sec = 1.2

[session]
hard_off_session_types = ["Time Trial"]
"#;
        let config = parse_toml(content).unwrap();
        assert!((config.filter.tau_sec - 1.2).abs() < f64::EPSILON);
        assert!((config.filter.dt_cap_sec - 0.10).abs() < f64::EPSILON);
        assert_eq!(config.session.hard_off_session_types, vec!["Time Trial"]);
        assert_eq!(config.latch.off_track_debounce_ticks, 3);
    }

    #[test]
    fn test_parse_empty_toml_is_default() {
        assert_eq!(parse_toml("").unwrap(), SaEngineConfig::default());
    }

    #[test]
    fn test_parse_json() {
        let content = r#"{ "slots": { "hysteresis_factor": 0.8, "exclude_pit_road": true } }"#;
        let config = parse_json(content).unwrap();
        assert!((config.slots.hysteresis_factor - 0.8).abs() < f64::EPSILON);
        assert!(config.slots.exclude_pit_road);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_wrong_type() {
        let err = parse_toml("[gate]\nmax_lap_delta = \"three\"\n").unwrap_err();
        assert!(err.to_string().contains("TOML parse error"), "got: {err}");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
