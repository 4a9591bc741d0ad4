use anyhow::Result;
use std::process;

use larder_core::db::Database;
use larder_core::models::{NewProduct, Product, ProductFilter};

use super::helpers::{format_amount, json_error, print_product_table, stock_mark};
use super::{resolve_product, resolve_store};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_product_add(
    db: &Database,
    name: &str,
    quantity: Option<f64>,
    unit: Option<String>,
    stores: &[String],
    in_stock: bool,
    photo: Option<String>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let store_ids = stores
        .iter()
        .map(|s| resolve_store(db, s).map(|s| s.id))
        .collect::<Result<Vec<_>>>()?;

    let product = db.insert_product(&NewProduct {
        name: name.to_string(),
        photo,
        quantity,
        unit,
        store_ids,
        in_stock,
        notes,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
    } else {
        let (name, id) = (&product.name, product.id);
        println!("Added product: {name} (id: {id})");
    }
    Ok(())
}

pub(crate) fn cmd_product_list(
    db: &Database,
    search: Option<String>,
    stores: &[String],
    in_stock: Option<bool>,
    json: bool,
) -> Result<()> {
    let store_ids = stores
        .iter()
        .map(|s| resolve_store(db, s).map(|s| s.id))
        .collect::<Result<Vec<_>>>()?;

    let products = db.list_products(&ProductFilter {
        search,
        store_ids,
        in_stock,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }
    if products.is_empty() {
        eprintln!("No products found");
        return Ok(());
    }
    let refs: Vec<&Product> = products.iter().collect();
    print_product_table(&refs);
    Ok(())
}

fn resolve_or_exit(db: &Database, query: &str, json: bool) -> Product {
    match resolve_product(db, query) {
        Ok(p) => p,
        Err(e) => {
            if json {
                println!("{}", json_error(&e.to_string()));
            } else {
                eprintln!("{e}");
            }
            process::exit(2);
        }
    }
}

pub(crate) fn cmd_product_show(db: &Database, product: &str, json: bool) -> Result<()> {
    let product = resolve_or_exit(db, product, json);

    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
        return Ok(());
    }

    let (name, id) = (&product.name, product.id);
    println!("{name} (id: {id})");
    println!("  Amount:   {}", format_amount(product.quantity, product.unit.as_deref()));
    println!("  In stock: {}", stock_mark(product.in_stock));
    if !product.stores.is_empty() {
        let stores: Vec<&str> = product.stores.iter().map(|s| s.name.as_str()).collect();
        println!("  Stores:   {}", stores.join(", "));
    }
    if let Some(notes) = &product.notes {
        println!("  Notes:    {notes}");
    }
    if let Some(photo) = &product.photo {
        println!("  Photo:    {photo}");
    }
    Ok(())
}

pub(crate) fn cmd_product_stock(
    db: &Database,
    product: &str,
    in_stock: bool,
    json: bool,
) -> Result<()> {
    let product = resolve_or_exit(db, product, json);
    let product = db.set_product_in_stock(product.id, in_stock)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
    } else {
        let name = &product.name;
        let state = if in_stock { "in stock" } else { "out of stock" };
        println!("Marked {name} {state}");
    }
    Ok(())
}

pub(crate) fn cmd_product_delete(db: &Database, product: &str, json: bool) -> Result<()> {
    let product = resolve_or_exit(db, product, json);
    db.delete_product(product.id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": product.id }));
    } else {
        let (name, id) = (&product.name, product.id);
        println!("Deleted product: {name} (id: {id})");
        println!("It was also removed from the shopping list, recent items and any recipes.");
    }
    Ok(())
}
