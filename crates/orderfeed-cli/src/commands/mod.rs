//! CLI command definitions and dispatch.

pub mod cart;
pub mod config;
pub mod orders;
pub mod push;
pub mod watch;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use orderfeed_api::HttpBackend;
use orderfeed_core::config::AppConfig;
use orderfeed_core::error::AppError;

/// orderfeed: orders, cart, and push from the terminal
#[derive(Debug, Parser)]
#[command(name = "orderfeed", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Order list and status changes
    Orders(orders::OrdersArgs),
    /// Cart editing and checkout
    Cart(cart::CartArgs),
    /// Push notification subscription
    Push(push::PushArgs),
    /// Follow the order list live until Ctrl-C
    Watch(watch::WatchArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Orders(args) => orders::execute(args, &self.config, self.format).await,
            Commands::Cart(args) => cart::execute(args, &self.config, self.format).await,
            Commands::Push(args) => push::execute(args, &self.config, self.format).await,
            Commands::Watch(args) => watch::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: REST client from config
pub fn create_backend(config: &AppConfig) -> Result<Arc<HttpBackend>, AppError> {
    HttpBackend::new(&config.api).map(Arc::new)
}
