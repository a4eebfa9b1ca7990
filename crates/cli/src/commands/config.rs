//! Configuration file commands

use std::path::Path;

use anyhow::Result;
use rckart_control::ControlConfig;
use tracing::debug;

use crate::commands::ConfigCommands;
use crate::error::CliError;
use crate::output;

/// Load `path` if given, otherwise fall back to defaults.
pub async fn load_config(path: Option<&Path>) -> Result<ControlConfig, CliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            Ok(ControlConfig::load_from_path(path).await?)
        }
        None => Ok(ControlConfig::default()),
    }
}

pub async fn execute(cmd: &ConfigCommands, config_path: Option<&Path>, json: bool) -> Result<()> {
    match cmd {
        ConfigCommands::Show { yaml } => show(config_path, *yaml, json).await,
        ConfigCommands::Validate { path } => validate(path, json).await,
        ConfigCommands::Init { path, force } => init(path, *force, json).await,
    }
}

async fn show(config_path: Option<&Path>, yaml: bool, json: bool) -> Result<()> {
    let config = load_config(config_path).await?;
    if yaml && !json {
        let rendered = serde_yaml::to_string(&config)
            .map_err(|err| CliError::ValidationError(format!("cannot render YAML: {err}")))?;
        print!("{rendered}");
    } else {
        output::print_config(&config, config_path, json);
    }
    Ok(())
}

async fn validate(path: &Path, json: bool) -> Result<()> {
    let config = ControlConfig::load_from_path(path)
        .await
        .map_err(CliError::from)?;
    output::print_config_valid(path, &config, json);
    Ok(())
}

async fn init(path: &Path, force: bool, json: bool) -> Result<()> {
    if !force && tokio::fs::try_exists(path).await.map_err(CliError::from)? {
        return Err(CliError::AlreadyExists(path.display().to_string()).into());
    }
    let config = ControlConfig::default();
    config.save_to_path(path).await.map_err(CliError::from)?;
    output::print_config_written(path, json);
    Ok(())
}
