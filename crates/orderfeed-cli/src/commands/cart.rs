//! Cart CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use orderfeed_core::error::AppError;
use orderfeed_core::types::{Cart, ProductId};
use orderfeed_service::CartController;

/// Arguments for cart commands
#[derive(Debug, Args)]
pub struct CartArgs {
    /// Cart subcommand
    #[command(subcommand)]
    pub command: CartCommand,
}

/// Cart subcommands
#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product: ProductId,
    },
    /// Remove one unit of a product; the last unit removes the line
    Dec {
        /// Product ID
        product: ProductId,
    },
    /// Remove a product line
    Remove {
        /// Product ID
        product: ProductId,
    },
    /// Place an order from the cart
    Checkout {
        /// Delivery address ID
        #[arg(short, long)]
        address: String,
        /// Note for the restaurant
        #[arg(short, long)]
        note: Option<String>,
    },
}

/// Cart line display row
#[derive(Debug, Serialize, Tabled)]
struct CartRow {
    /// Product ID
    product: i64,
    /// Name
    name: String,
    /// Quantity
    qty: u32,
    /// Unit price
    unit: String,
    /// Line total
    total: String,
}

/// Execute cart commands
pub async fn execute(
    args: &CartArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let backend = super::create_backend(&config)?;
    let cart = CartController::new(backend);

    match &args.command {
        CartCommand::Show => print_cart(&cart.load_cart().await?, format),
        CartCommand::Add { product } => print_cart(&cart.increment(*product).await?, format),
        CartCommand::Dec { product } => {
            // Decrement decides between decrease and removal from the cart it holds.
            cart.load_cart().await?;
            print_cart(&cart.decrement(*product).await?, format);
        }
        CartCommand::Remove { product } => print_cart(&cart.remove(*product).await?, format),
        CartCommand::Checkout { address, note } => {
            cart.load_cart().await?;
            let order = cart.checkout(address, note.as_deref()).await?;
            output::print_success(&format!(
                "Order {} placed, total {}",
                order.order_id,
                output::money(order.total_price)
            ));
        }
    }

    Ok(())
}

fn print_cart(cart: &Cart, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_item(cart, format);
        return;
    }
    let rows: Vec<CartRow> = cart
        .items
        .iter()
        .map(|line| CartRow {
            product: line.product_id.get(),
            name: line.product_name.clone().unwrap_or_default(),
            qty: line.quantity,
            unit: output::money(line.unit_price),
            total: output::money(line.line_total),
        })
        .collect();
    output::print_list(&rows, format);
    if let Some(name) = &cart.restaurant_name {
        output::print_kv("Restaurant", name);
    }
    output::print_kv("Items", &cart.total_item_count.to_string());
    output::print_kv("Total", &output::money(cart.cart_total));
}
