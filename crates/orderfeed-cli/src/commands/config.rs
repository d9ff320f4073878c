//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use orderfeed_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path)?;
            if config.api.auth_token.is_some() {
                config.api.auth_token = Some("****".to_string());
            }
            match format {
                OutputFormat::Json => output::print_item(&config, format),
                OutputFormat::Table => {
                    for (section, value) in [
                        ("api", serde_json::to_value(&config.api)),
                        ("push", serde_json::to_value(&config.push)),
                        ("live_feed", serde_json::to_value(&config.live_feed)),
                        ("view", serde_json::to_value(&config.view)),
                        ("logging", serde_json::to_value(&config.logging)),
                    ] {
                        println!("[{section}]");
                        output::print_item(&value?, format);
                    }
                }
            }
        }
        ConfigCommand::Validate => {
            let config = super::load_config(config_path)?;
            if let Err(e) = config.validate() {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
            output::print_success(&format!("Configuration '{config_path}' is valid"));
            output::print_kv("API", &config.api.base_url);
            output::print_kv("Scope", &format!("{:?}", config.view.scope));
            output::print_kv(
                "Push",
                if config.push.enabled { "enabled" } else { "disabled" },
            );
            output::print_kv(
                "Live feed",
                &match config.live_feed.restaurant_id {
                    Some(id) => format!("{} (restaurant {id})", config.live_feed.url),
                    None => "off".to_string(),
                },
            );
        }
    }

    Ok(())
}
