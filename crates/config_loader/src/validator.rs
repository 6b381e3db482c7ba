//! Tuning profile validation
//!
//! Rules:
//! - every per-field range declared on the contract structs
//! - cool_delta_sec >= hot_delta_sec
//! - 0 < hysteresis_factor <= 1
//! - half_lap_deadband < 0.5
//! - hard-off session type names are not blank

use contracts::{ContractError, SaEngineConfig};
use validator::Validate;

/// Validate a tuning profile
///
/// Returns the first error encountered.
pub fn validate(config: &SaEngineConfig) -> Result<(), ContractError> {
    config.validate()?;
    validate_status_thresholds(config)?;
    validate_slots(config)?;
    validate_session(config)?;
    Ok(())
}

fn validate_status_thresholds(config: &SaEngineConfig) -> Result<(), ContractError> {
    let status = &config.status;
    if status.cool_delta_sec < status.hot_delta_sec {
        return Err(ContractError::config_validation(
            "status.hot_delta_sec / status.cool_delta_sec",
            format!(
                "cool_delta_sec ({}) must be >= hot_delta_sec ({})",
                status.cool_delta_sec, status.hot_delta_sec
            ),
        ));
    }
    Ok(())
}

fn validate_slots(config: &SaEngineConfig) -> Result<(), ContractError> {
    let slots = &config.slots;
    if !(slots.hysteresis_factor > 0.0 && slots.hysteresis_factor <= 1.0) {
        return Err(ContractError::config_validation(
            "slots.hysteresis_factor",
            format!(
                "hysteresis_factor must be in (0, 1], got {}",
                slots.hysteresis_factor
            ),
        ));
    }
    if slots.half_lap_deadband.is_nan() || slots.half_lap_deadband >= 0.5 {
        return Err(ContractError::config_validation(
            "slots.half_lap_deadband",
            format!(
                "half_lap_deadband must be < 0.5, got {}",
                slots.half_lap_deadband
            ),
        ));
    }
    Ok(())
}

fn validate_session(config: &SaEngineConfig) -> Result<(), ContractError> {
    for (idx, name) in config.session.hard_off_session_types.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("session.hard_off_session_types[{idx}]"),
                "session type name cannot be empty",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(validate(&SaEngineConfig::default()).is_ok());
    }

    #[test]
    fn test_cool_below_hot_rejected() {
        let mut config = SaEngineConfig::default();
        config.status.hot_delta_sec = 0.6;
        config.status.cool_delta_sec = 0.4;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cool_delta_sec"), "got: {err}");
    }

    #[test]
    fn test_hysteresis_range() {
        let mut config = SaEngineConfig::default();
        config.slots.hysteresis_factor = 1.0;
        assert!(validate(&config).is_ok());

        config.slots.hysteresis_factor = 0.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("hysteresis_factor"), "got: {err}");
    }

    #[test]
    fn test_deadband_at_half_lap_rejected() {
        let mut config = SaEngineConfig::default();
        config.slots.half_lap_deadband = 0.5;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("half_lap_deadband"), "got: {err}");
    }

    #[test]
    fn test_field_range_rejected() {
        let mut config = SaEngineConfig::default();
        config.filter.tau_sec = -1.0;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_blank_session_type_rejected() {
        let mut config = SaEngineConfig::default();
        config.session.hard_off_session_types.push("  ".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("hard_off_session_types[2]"), "got: {err}");
    }
}
