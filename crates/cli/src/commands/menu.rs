//! Menu browsing commands.

use eathub_client::EatHub;
use eathub_core::{MenuItem, MenuItemId, MenuQuery};

use super::CliError;

/// `eathub menu`
#[allow(clippy::print_stdout)]
pub async fn list(
    hub: &EatHub,
    featured: bool,
    category: Option<String>,
    search: Option<String>,
    cached: bool,
) -> Result<(), CliError> {
    let items = if featured {
        hub.menu().get_featured_items().await?
    } else {
        let query = MenuQuery { category, search };
        if cached {
            hub.menu().get_menu_items_cached(&query).await?
        } else {
            hub.menu().get_menu_items(&query).await?
        }
    };

    if items.is_empty() {
        println!("No menu items found.");
        return Ok(());
    }
    for item in &items {
        println!("{}", line(item));
    }
    Ok(())
}

/// `eathub item <id>`
#[allow(clippy::print_stdout)]
pub async fn item(hub: &EatHub, id: &str) -> Result<(), CliError> {
    let item = hub.menu().get_menu_item(&MenuItemId::new(id)).await?;
    println!("{}", line(&item));
    if let Some(description) = &item.description {
        println!("  {description}");
    }
    if let Some(category) = &item.category {
        println!("  category: {category}");
    }
    let in_cart = hub.cart().state().quantity_of(&item.id);
    if in_cart > 0 {
        println!("  in cart: {in_cart}");
    }
    Ok(())
}

/// `eathub categories`
#[allow(clippy::print_stdout)]
pub async fn categories(hub: &EatHub) -> Result<(), CliError> {
    for category in hub.menu().get_categories().await? {
        match category.item_count {
            Some(n) => println!("{} ({n})", category.name),
            None => println!("{}", category.name),
        }
    }
    Ok(())
}

/// `eathub announcement`
#[allow(clippy::print_stdout)]
pub async fn announcement(hub: &EatHub) -> Result<(), CliError> {
    let announcement = hub.menu().get_announcement().await?;
    if announcement.active && !announcement.message.is_empty() {
        println!("{}", announcement.message);
    } else {
        println!("No announcement.");
    }
    Ok(())
}

fn line(item: &MenuItem) -> String {
    let mut flags = String::new();
    if item.featured {
        flags.push_str(" *");
    }
    if !item.available {
        flags.push_str(" (sold out)");
    }
    format!("[{}] {} - {}{flags}", item.id, item.name, item.price)
}
