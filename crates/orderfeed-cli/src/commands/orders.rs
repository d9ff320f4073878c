//! Order list and status CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use orderfeed_api::OrdersApi;
use orderfeed_core::config::ViewScope;
use orderfeed_core::error::AppError;
use orderfeed_core::types::{OrderId, OrderRecord, OrderStatus};
use orderfeed_service::{OrderBoard, OrderController};

/// Arguments for order commands
#[derive(Debug, Args)]
pub struct OrdersArgs {
    /// Orders subcommand
    #[command(subcommand)]
    pub command: OrdersCommand,
}

/// Orders subcommands
#[derive(Debug, Subcommand)]
pub enum OrdersCommand {
    /// List orders for the configured scope
    List {
        /// Override the configured scope
        #[arg(short, long, value_enum)]
        scope: Option<ScopeArg>,
    },
    /// Show one order with its lines
    Show {
        /// Order ID
        id: OrderId,
    },
    /// Cancel a pending or preparing order
    Cancel {
        /// Order ID
        id: OrderId,
    },
    /// Move an order to its next status (restaurant only)
    Advance {
        /// Order ID
        id: OrderId,
        /// Target status instead of the next one
        #[arg(long)]
        to: Option<OrderStatus>,
    },
}

/// Scope selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScopeArg {
    /// My orders
    Customer,
    /// Orders received by my restaurant
    Restaurant,
}

impl From<ScopeArg> for ViewScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Customer => ViewScope::Customer,
            ScopeArg::Restaurant => ViewScope::Restaurant,
        }
    }
}

/// Order display row
#[derive(Debug, Serialize, Tabled)]
pub(crate) struct OrderRow {
    /// Order ID
    id: i64,
    /// Restaurant
    restaurant: String,
    /// Status
    status: String,
    /// Item count
    items: u32,
    /// Total
    total: String,
    /// Placed at
    placed: String,
}

impl From<&OrderRecord> for OrderRow {
    fn from(order: &OrderRecord) -> Self {
        Self {
            id: order.order_id.get(),
            restaurant: order
                .restaurant_name
                .clone()
                .or_else(|| order.restaurant_id.map(|id| id.to_string()))
                .unwrap_or_else(|| "-".to_string()),
            status: order.status.to_string(),
            items: order.items.iter().map(|i| i.quantity).sum(),
            total: output::money(order.total_price),
            placed: order
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Order line display row
#[derive(Debug, Serialize, Tabled)]
struct OrderItemRow {
    /// Product ID
    product: String,
    /// Name
    name: String,
    /// Quantity
    qty: u32,
    /// Unit price
    unit: String,
    /// Line total
    total: String,
}

/// Execute order commands
pub async fn execute(
    args: &OrdersArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let backend = super::create_backend(&config)?;

    let scope = match &args.command {
        OrdersCommand::List { scope: Some(scope) } => ViewScope::from(*scope),
        OrdersCommand::Advance { .. } => ViewScope::Restaurant,
        _ => config.view.scope,
    };
    let controller = OrderController::new(backend.clone(), Arc::new(OrderBoard::new()), scope);

    match &args.command {
        OrdersCommand::List { .. } => {
            controller.fetch_orders().await?;
            let orders = controller.board().snapshot().await;
            let rows: Vec<OrderRow> = orders.iter().map(OrderRow::from).collect();
            output::print_list(&rows, format);
        }
        OrdersCommand::Show { id } => {
            let order = backend.order(*id).await?;
            print_order(&order, format);
        }
        OrdersCommand::Cancel { id } => {
            let order = controller.cancel(*id).await?;
            output::print_success(&format!("Order {} cancelled", order.order_id));
        }
        OrdersCommand::Advance { id, to } => {
            let order = controller.advance(*id, *to).await?;
            output::print_success(&format!("Order {} is now {}", order.order_id, order.status));
        }
    }

    Ok(())
}

fn print_order(order: &OrderRecord, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_item(order, format);
        return;
    }
    output::print_kv("Order", &order.order_id.to_string());
    output::print_kv("Status", order.status.as_str());
    output::print_kv(
        "Restaurant",
        order.restaurant_name.as_deref().unwrap_or("-"),
    );
    output::print_kv("Total", &output::money(order.total_price));
    if let Some(note) = &order.note {
        output::print_kv("Note", note);
    }
    let rows: Vec<OrderItemRow> = order
        .items
        .iter()
        .map(|item| OrderItemRow {
            product: item
                .product_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            name: item.product_name.clone().unwrap_or_default(),
            qty: item.quantity,
            unit: output::money(item.unit_price),
            total: output::money(item.line_total()),
        })
        .collect();
    output::print_list(&rows, format);
}
