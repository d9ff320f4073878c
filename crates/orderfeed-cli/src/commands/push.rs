//! Push subscription CLI commands.

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;
use orderfeed_core::types::NotificationPermissionState;
use orderfeed_push::{
    DistributorPlatform, NonInteractivePrompt, PermissionPrompt, PushSubscriptionManager,
    SubscribeOutcome,
};

/// Arguments for push commands
#[derive(Debug, Args)]
pub struct PushArgs {
    /// Push subcommand
    #[command(subcommand)]
    pub command: PushCommand,
}

/// Push subcommands
#[derive(Debug, Subcommand)]
pub enum PushCommand {
    /// Ask for permission if needed, subscribe, and register with the backend
    Subscribe {
        /// Never prompt; an unanswered permission stays unanswered
        #[arg(long)]
        no_prompt: bool,
    },
    /// Show permission and subscription state
    Status,
}

/// Terminal yes/no prompt for the notification permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmPrompt;

#[async_trait]
impl PermissionPrompt for ConfirmPrompt {
    async fn ask(&self) -> AppResult<NotificationPermissionState> {
        let answer = tokio::task::spawn_blocking(|| {
            dialoguer::Confirm::new()
                .with_prompt("Allow order notifications on this device?")
                .default(true)
                .interact_opt()
        })
        .await
        .map_err(|e| AppError::internal(format!("Prompt task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

        Ok(permission_from_answer(answer))
    }
}

/// `None` is a dismissed prompt.
fn permission_from_answer(answer: Option<bool>) -> NotificationPermissionState {
    match answer {
        Some(true) => NotificationPermissionState::Granted,
        Some(false) => NotificationPermissionState::Denied,
        None => NotificationPermissionState::Default,
    }
}

/// Execute push commands
pub async fn execute(
    args: &PushArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let backend = super::create_backend(&config)?;
    let manager = PushSubscriptionManager::new(
        Arc::new(DistributorPlatform::from_config(&config.push)),
        backend,
        config.push.vapid_public_key.clone(),
    );

    match &args.command {
        PushCommand::Subscribe { no_prompt } => {
            let prompt: &dyn PermissionPrompt = if *no_prompt {
                &NonInteractivePrompt
            } else {
                &ConfirmPrompt
            };
            match manager.ensure_subscribed(prompt).await? {
                SubscribeOutcome::Subscribed(descriptor) => {
                    output::print_success(&format!("Subscribed: {}", descriptor.endpoint));
                }
                SubscribeOutcome::NotGranted(state) => {
                    output::print_warning(&format!("Notification permission is {state}"));
                }
                SubscribeOutcome::Unsupported => {
                    output::print_warning("Push notifications are not supported on this device");
                }
            }
        }
        PushCommand::Status => {
            let status = manager.status().await?;
            output::print_item(&status, format);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_from_answer() {
        assert_eq!(permission_from_answer(Some(true)), NotificationPermissionState::Granted);
        assert_eq!(permission_from_answer(Some(false)), NotificationPermissionState::Denied);
        assert_eq!(permission_from_answer(None), NotificationPermissionState::Default);
    }
}
