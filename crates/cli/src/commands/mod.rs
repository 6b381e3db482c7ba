//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::SaEngineConfig;

use crate::error::CliError;

/// Load a tuning profile, or the defaults when no path is given
pub(crate) fn load_engine_config(path: Option<&Path>) -> Result<SaEngineConfig> {
    let Some(path) = path else {
        return Ok(SaEngineConfig::default());
    };
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load tuning profile from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults_without_path() {
        assert_eq!(load_engine_config(None).unwrap(), SaEngineConfig::default());
    }

    #[test]
    fn test_load_missing_path() {
        let err = load_engine_config(Some(Path::new("/nonexistent/sa.toml"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_load_profile() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[slots]\nhysteresis_factor = 0.8").unwrap();
        let config = load_engine_config(Some(file.path())).unwrap();
        assert!((config.slots.hysteresis_factor - 0.8).abs() < f64::EPSILON);
    }
}
