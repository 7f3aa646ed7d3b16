//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! tienda cart add --id 12 --name "Remera" --price 12.50 -q 2 --size M
//! tienda cart update --id 12 --size M 5
//! tienda cart remove --id 12 --size M
//! tienda cart clear
//! ```

use clap::{Args, Subcommand};
use rust_decimal::Decimal;

use tienda_console::error::add_breadcrumb;
use tienda_console::{AppError, AppState, Result};
use tienda_core::{Applied, CartState, Product, ProductId};

#[derive(Subcommand)]
pub enum CartCommand {
    /// Print the cart lines and total
    Show,
    /// Add units of a product variant
    Add {
        #[command(flatten)]
        line: LineArgs,

        /// Product name
        #[arg(short, long)]
        name: String,

        /// Unit price
        #[arg(short, long)]
        price: Decimal,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Product image URL
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Remove a line
    Remove {
        #[command(flatten)]
        line: LineArgs,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        #[command(flatten)]
        line: LineArgs,

        /// New quantity
        quantity: u32,
    },
    /// Remove every line
    Clear,
    /// Flip the cart panel open or closed
    Toggle,
}

/// Identity of a cart line.
#[derive(Args)]
pub struct LineArgs {
    /// Product ID
    #[arg(long)]
    id: i64,

    /// Selected size
    #[arg(long)]
    size: Option<String>,

    /// Selected color
    #[arg(long)]
    color: Option<String>,
}

pub fn run(state: &mut AppState, command: CartCommand) -> Result<()> {
    match command {
        CartCommand::Show => {}
        CartCommand::Add {
            line,
            name,
            price,
            quantity,
            image_url,
        } => {
            if price.is_sign_negative() {
                return Err(AppError::BadRequest("price cannot be negative".to_string()));
            }
            let product = Product {
                image_url,
                ..Product::new(ProductId::new(line.id), name, price)
            };
            let applied = state
                .cart_mut()
                .add_item(product, quantity, line.size, line.color)?;
            if applied == Applied::Rejected {
                return Err(rejected(quantity));
            }
            let product_id = line.id.to_string();
            add_breadcrumb("cart", "Added item", Some(&[("product_id", product_id.as_str())]));
        }
        CartCommand::Remove { line } => {
            state
                .cart_mut()
                .remove_item(ProductId::new(line.id), line.size, line.color)?;
        }
        CartCommand::Update { line, quantity } => {
            let applied = state.cart_mut().update_quantity(
                ProductId::new(line.id),
                quantity,
                line.size,
                line.color,
            )?;
            if applied == Applied::Rejected {
                return Err(rejected(quantity));
            }
        }
        CartCommand::Clear => state.cart_mut().clear_cart()?,
        CartCommand::Toggle => {
            state.cart_mut().toggle_cart();
            let panel = if state.cart().is_open() { "open" } else { "closed" };
            println!("Cart panel {panel}");
            return Ok(());
        }
    }

    print_cart(state.cart().state());
    Ok(())
}

fn rejected(quantity: u32) -> AppError {
    let message = if quantity == 0 {
        "quantity must be at least 1"
    } else {
        "cart total would be too large"
    };
    AppError::BadRequest(message.to_string())
}

fn print_cart(cart: &CartState) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in cart.items() {
        let variant: Vec<&str> = [item.selected_size.as_deref(), item.selected_color.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        let variant = if variant.is_empty() {
            String::new()
        } else {
            format!(" ({})", variant.join(", "))
        };
        println!(
            "{:>6}  {}{}  {} x {} = {}",
            item.product.id,
            item.product.name,
            variant,
            item.quantity,
            item.product.price,
            item.line_total()
                .map_or_else(|| "-".to_string(), |total| total.to_string())
        );
    }
    println!("{} items, total {}", cart.item_count(), cart.total());
}
