//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::SaEngineConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    off_track_debounce_ticks: u32,
    truth_max_age_sec: f64,
    filter_tau_sec: f64,
    hysteresis_factor: f64,
    hard_off_session_types: Vec<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating tuning profile");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        Err(CliError::config_validation(result.error.unwrap_or_default()).into())
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    off_track_debounce_ticks: config.latch.off_track_debounce_ticks,
                    truth_max_age_sec: config.gate.truth_max_age_sec,
                    filter_tau_sec: config.filter.tau_sec,
                    hysteresis_factor: config.slots.hysteresis_factor,
                    hard_off_session_types: config.session.hard_off_session_types.clone(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect non-fatal tuning issues
fn collect_warnings(config: &SaEngineConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.filter.sticky_hold_sec > config.gate.truth_max_age_sec {
        warnings.push(format!(
            "filter.sticky_hold_sec ({}) outlives gate.truth_max_age_sec ({})",
            config.filter.sticky_hold_sec, config.gate.truth_max_age_sec
        ));
    }

    if config.slots.hysteresis_factor >= 1.0 {
        warnings.push("slots.hysteresis_factor = 1.0 disables slot hysteresis".to_string());
    }

    if config.latch.off_track_debounce_ticks == 1 {
        warnings.push("latch.off_track_debounce_ticks = 1 latches on a single sample".to_string());
    }

    if config.session.hard_off_session_types.is_empty() {
        warnings.push("session.hard_off_session_types is empty".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("OK  Tuning profile is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Off-track debounce: {} ticks", summary.off_track_debounce_ticks);
            println!("  Gate truth max age: {}s", summary.truth_max_age_sec);
            println!("  Filter tau: {}s", summary.filter_tau_sec);
            println!("  Slot hysteresis: {}", summary.hysteresis_factor);
            println!("  Hard-off sessions: {:?}", summary.hard_off_session_types);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("ERR Tuning profile is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
