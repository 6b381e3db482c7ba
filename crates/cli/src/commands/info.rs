//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{CHECKPOINT_COUNT, MAX_CARS, SECTOR_COUNT, SLOTS_AHEAD, SLOTS_BEHIND};
use serde::Serialize;
use tracing::info;

use super::load_engine_config;
use crate::cli::InfoArgs;

/// Compile-time engine limits
#[derive(Serialize)]
struct Limits {
    max_cars: usize,
    slots_ahead: usize,
    slots_behind: usize,
    checkpoints: usize,
    sectors: usize,
}

#[derive(Serialize)]
struct EngineInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_path: Option<String>,
    limits: Limits,
    tuning: contracts::SaEngineConfig,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = ?args.config, "Loading tuning info");

    let config = load_engine_config(args.config.as_deref())?;

    if args.json {
        let info = EngineInfo {
            config_path: args.config.as_ref().map(|p| p.display().to_string()),
            limits: limits(),
            tuning: config,
        };
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize engine info")?;
        println!("{}", json);
    } else {
        print_engine_info(&config, args)?;
    }

    Ok(())
}

fn limits() -> Limits {
    Limits {
        max_cars: MAX_CARS,
        slots_ahead: SLOTS_AHEAD,
        slots_behind: SLOTS_BEHIND,
        checkpoints: CHECKPOINT_COUNT,
        sectors: SECTOR_COUNT,
    }
}

fn print_engine_info(config: &contracts::SaEngineConfig, args: &InfoArgs) -> Result<()> {
    let limits = limits();
    println!("\n=== SA Engine ===\n");
    match &args.config {
        Some(path) => println!("Tuning profile: {}", path.display()),
        None => println!("Tuning profile: (defaults)"),
    }
    println!(
        "Limits: {} cars, {} ahead / {} behind slots, {} checkpoints, {} sectors",
        limits.max_cars, limits.slots_ahead, limits.slots_behind, limits.checkpoints, limits.sectors
    );
    println!("\n--- effective tuning ---\n");
    let toml = config_loader::ConfigLoader::to_toml(config).context("Failed to render tuning")?;
    println!("{}", toml);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_defaults() {
        let args = InfoArgs {
            config: None,
            json: true,
        };
        assert!(run_info(&args).is_ok());
    }

    #[test]
    fn test_info_missing_profile() {
        let args = InfoArgs {
            config: Some("/nonexistent/sa.toml".into()),
            json: false,
        };
        assert!(run_info(&args).is_err());
    }
}
