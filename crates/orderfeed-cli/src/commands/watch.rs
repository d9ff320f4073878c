//! Live order list in the terminal.

use clap::Args;
use tracing::debug;

use super::orders::{OrderRow, ScopeArg};
use super::push::ConfirmPrompt;
use crate::output::{self, OutputFormat};
use orderfeed_core::config::ViewScope;
use orderfeed_core::error::AppError;
use orderfeed_push::{NonInteractivePrompt, PermissionPrompt};
use orderfeed_realtime::{ClientApp, FeedEvent};

/// Arguments for the watch command
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Follow this restaurant's live order feed (implies restaurant scope)
    #[arg(short, long)]
    pub restaurant: Option<i64>,

    /// Override the configured scope
    #[arg(short, long, value_enum)]
    pub scope: Option<ScopeArg>,

    /// Never prompt for the notification permission
    #[arg(long)]
    pub no_prompt: bool,
}

/// Execute the watch command
pub async fn execute(args: &WatchArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let mut config = super::load_config(config_path)?;
    if let Some(scope) = args.scope {
        config.view.scope = ViewScope::from(scope);
    }
    if let Some(restaurant) = args.restaurant {
        config.view.scope = ViewScope::Restaurant;
        config.live_feed.restaurant_id = Some(restaurant);
    }

    let prompt: &dyn PermissionPrompt = if args.no_prompt {
        &NonInteractivePrompt
    } else {
        &ConfirmPrompt
    };
    let app = ClientApp::start(&config, prompt).await?;
    let board = app.view().board().clone();
    let mut revisions = board.subscribe();
    let mut feed = app.view().feed_events();

    print_board(&board.snapshot().await, format);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                print_board(&board.snapshot().await, format);
            }
            event = recv_feed(&mut feed) => match event {
                Some(FeedEvent::Connected { topic }) => {
                    output::print_success(&format!("Live feed connected: {topic}"));
                }
                Some(FeedEvent::Error(message)) => {
                    output::print_warning(&format!("Live feed error: {message}"));
                }
                Some(FeedEvent::Closed) => {
                    output::print_warning("Live feed closed");
                    feed = None;
                }
                Some(FeedEvent::Order(order)) => debug!(order_id = %order.order_id, "Live order"),
                None => feed = None,
            },
        }
    }

    app.shutdown().await
}

/// Next feed event; pending forever when there is no feed.
async fn recv_feed(
    feed: &mut Option<tokio::sync::broadcast::Receiver<FeedEvent>>,
) -> Option<FeedEvent> {
    let Some(rx) = feed.as_mut() else {
        return std::future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped = skipped, "Feed events skipped");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
        }
    }
}

fn print_board(orders: &[orderfeed_core::types::OrderRecord], format: OutputFormat) {
    let rows: Vec<OrderRow> = orders.iter().map(OrderRow::from).collect();
    output::print_list(&rows, format);
}
