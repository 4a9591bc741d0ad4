use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use larder_core::PlannerService;
use larder_core::models::{Product, RecentItem, ShoppingListEntry};

use super::helpers::{format_amount, stock_mark, truncate};
use super::resolve_product;

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Product")]
    name: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "In stock")]
    in_stock: &'static str,
    #[tabled(rename = "Stores")]
    stores: String,
    #[tabled(rename = "When")]
    when: String,
}

fn row(product: &Product, when: &str) -> ListRow {
    ListRow {
        id: product.id,
        name: truncate(&product.name, 30),
        amount: format_amount(product.quantity, product.unit.as_deref()),
        in_stock: stock_mark(product.in_stock),
        stores: product
            .stores
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        when: local_time(when),
    }
}

// Removing an unlisted product is a no-op, not an error.
fn removal_message(name: &str, removed: bool) -> String {
    if removed {
        format!("Removed {name} from the shopping list")
    } else {
        format!("{name} was not on the shopping list, nothing to remove")
    }
}

/// Render a stored UTC timestamp in local time, falling back to the raw text.
fn local_time(stored: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(stored) {
        Ok(t) => t
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => stored.to_string(),
    }
}

fn print_entries(entries: &[ShoppingListEntry]) {
    let rows: Vec<ListRow> = entries
        .iter()
        .map(|e| row(&e.product, &e.added_at))
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
}

fn print_recent(items: &[RecentItem]) {
    let rows: Vec<ListRow> = items
        .iter()
        .map(|r| row(&r.product, &r.last_used))
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn cmd_list_add(service: &PlannerService, product: &str, json: bool) -> Result<()> {
    let product = resolve_product(service.db(), product)?;
    let added = service.add_to_list(product.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&added)?);
    } else if added.created {
        println!("Added {} to the shopping list", product.name);
    } else {
        println!("{} is already on the shopping list", product.name);
    }
    Ok(())
}

pub(crate) fn cmd_list_remove(service: &PlannerService, product: &str, json: bool) -> Result<()> {
    let product = resolve_product(service.db(), product)?;
    let removed = service.remove_from_list(product.id)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "product_id": product.id, "removed": removed })
        );
    } else {
        println!("{}", removal_message(&product.name, removed));
    }
    Ok(())
}

pub(crate) fn cmd_list_show(service: &PlannerService, json: bool) -> Result<()> {
    let view = service.browse()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.shopping_list.is_empty() {
        println!("Shopping list is empty");
    } else {
        println!("Shopping list:");
        print_entries(&view.shopping_list);
    }
    if !view.recent.is_empty() {
        println!("\nRecently used:");
        print_recent(&view.recent);
    }
    Ok(())
}

pub(crate) fn cmd_recent(service: &PlannerService, limit: usize, json: bool) -> Result<()> {
    let items = service.recent_items(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        eprintln!("No recent items");
        return Ok(());
    }
    print_recent(&items);
    Ok(())
}
