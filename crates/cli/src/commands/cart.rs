//! Cart, checkout and order tracking commands.

use clap::{Args, ValueEnum};
use eathub_client::{CheckoutOptions, EatHub};
use eathub_core::{CustomerDetails, Email, Fulfillment, MenuItemId, NewCartItem, OrderNumber, PaymentMethod};

use super::CliError;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Payment {
    Cash,
    Card,
    Online,
}

impl From<Payment> for PaymentMethod {
    fn from(p: Payment) -> Self {
        match p {
            Payment::Cash => Self::Cash,
            Payment::Card => Self::Card,
            Payment::Online => Self::Online,
        }
    }
}

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(short, long)]
    pub name: String,

    #[arg(short, long)]
    pub phone: String,

    #[arg(short, long)]
    pub email: Option<String>,

    /// Deliver to this address instead of pickup
    #[arg(short, long)]
    pub address: Option<String>,

    #[arg(long, value_enum, default_value_t = Payment::Cash)]
    pub payment: Payment,

    /// Voucher code to apply
    #[arg(short, long)]
    pub voucher: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

/// `eathub cart add <id>`
#[allow(clippy::print_stdout)]
pub async fn add(hub: &EatHub, id: &str, quantity: u32) -> Result<(), CliError> {
    let item = hub.menu().get_menu_item(&MenuItemId::new(id)).await?;
    if !item.available {
        return Err(CliError::Usage(format!("{} is sold out", item.name)));
    }
    let cart = hub
        .cart()
        .add_item(NewCartItem::from(&item).with_quantity(quantity));
    println!(
        "Added {quantity} x {}. Cart: {} items, {}",
        item.name,
        cart.item_count(),
        cart.total_price()
    );
    Ok(())
}

/// `eathub cart set <id> <quantity>`
pub fn set(hub: &EatHub, id: &str, quantity: i64) {
    hub.cart().update_quantity(MenuItemId::new(id), quantity);
    list(hub);
}

/// `eathub cart remove <id>`
pub fn remove(hub: &EatHub, id: &str) {
    hub.cart().remove_item(MenuItemId::new(id));
    list(hub);
}

/// `eathub cart list`
#[allow(clippy::print_stdout)]
pub fn list(hub: &EatHub) {
    let cart = hub.cart().state();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in cart.items() {
        println!(
            "[{}] {} x {} = {}",
            line.id,
            line.quantity,
            line.name,
            line.line_total()
        );
    }
    println!("{} items, total {}", cart.item_count(), cart.total_price());
}

/// `eathub cart clear`
#[allow(clippy::print_stdout)]
pub fn clear(hub: &EatHub) {
    hub.cart().clear();
    println!("Cart cleared.");
}

/// `eathub checkout`
#[allow(clippy::print_stdout)]
pub async fn checkout(hub: &EatHub, args: CheckoutArgs) -> Result<(), CliError> {
    let email = args
        .email
        .as_deref()
        .map(Email::parse)
        .transpose()
        .map_err(eathub_client::Error::from)?;
    let fulfillment = if args.address.is_some() {
        Fulfillment::Delivery
    } else {
        Fulfillment::Pickup
    };
    let customer = CustomerDetails {
        name: args.name,
        phone: args.phone,
        email,
        address: args.address,
    };
    let options = CheckoutOptions {
        fulfillment,
        payment_method: args.payment.into(),
        voucher_code: args.voucher,
        notes: args.notes,
    };

    let order = hub.checkout(customer, options).await?;
    println!("Order {} placed: {} ({})", order.order_number, order.total, order.status);
    if let Some(discount) = order.discount.filter(|d| !d.is_zero()) {
        println!("Discount applied: {discount}");
    }
    println!("Track it with `eathub track {}`", order.order_number);
    Ok(())
}

/// `eathub track <order-number>`
#[allow(clippy::print_stdout)]
pub async fn track(hub: &EatHub, order_number: &str) -> Result<(), CliError> {
    let order = hub.orders().get_order(&OrderNumber::new(order_number)).await?;
    println!("Order {}: {}", order.order_number, order.status);
    for line in &order.items {
        println!("  {} x {}", line.quantity, line.name);
    }
    println!("Total {}", order.total);
    Ok(())
}
