use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::models::{Product, RecipeDetail};

/// One `--ingredient` argument, before the product name is resolved.
#[derive(Debug, PartialEq)]
pub(crate) struct IngredientSpec {
    pub product: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// Parse "Eggs:3 units", "Cheese:50g", "Milk:300 ml" or just "Onions".
pub(crate) fn parse_ingredient(s: &str) -> Result<IngredientSpec> {
    let (product, amount) = match s.rsplit_once(':') {
        Some((product, amount)) => (product.trim(), Some(amount.trim())),
        None => (s.trim(), None),
    };
    if product.is_empty() {
        bail!("Invalid ingredient '{s}'. Use 'product' or 'product:quantity unit'");
    }

    let (quantity, unit) = match amount.filter(|a| !a.is_empty()) {
        None => (None, None),
        Some(amount) => {
            let (qty, unit) = parse_amount(amount)
                .with_context(|| format!("Invalid ingredient amount in '{s}'"))?;
            (Some(qty), unit)
        }
    };

    Ok(IngredientSpec {
        product: product.to_string(),
        quantity,
        unit,
    })
}

/// Parse "3", "50g", "300 ml" into a quantity and optional unit.
pub(crate) fn parse_amount(s: &str) -> Result<(f64, Option<String>)> {
    let s = s.trim();
    if let Ok(qty) = s.parse::<f64>() {
        return Ok((check_quantity(qty)?, None));
    }
    if let Some((qty, unit)) = split_number_unit(s) {
        return Ok((check_quantity(qty)?, Some(unit.to_string())));
    }
    let parts: Vec<&str> = s.splitn(2, char::is_whitespace).collect();
    if parts.len() == 2 {
        let qty: f64 = parts[0]
            .parse()
            .with_context(|| format!("Invalid quantity: '{s}'"))?;
        return Ok((check_quantity(qty)?, Some(parts[1].trim().to_string())));
    }
    bail!("Invalid amount '{s}'. Use '3', '50g' or '300 ml'")
}

fn check_quantity(qty: f64) -> Result<f64> {
    if !qty.is_finite() || qty < 0.0 {
        bail!("Quantity must be a non-negative number");
    }
    Ok(qty)
}

/// Split "500ml" or "2.5kg" into (500.0, "ml") or (2.5, "kg").
fn split_number_unit(s: &str) -> Option<(f64, &str)> {
    let idx = s.find(|c: char| c.is_alphabetic())?;
    if idx == 0 {
        return None;
    }
    let (num_part, unit_part) = s.split_at(idx);
    let qty: f64 = num_part.trim().parse().ok()?;
    if unit_part.is_empty() {
        return None;
    }
    Some((qty, unit_part))
}

pub(crate) fn prompt_choice(count: usize, what: &str) -> Result<usize> {
    eprint!("\nSelect a {what} (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn format_amount(quantity: Option<f64>, unit: Option<&str>) -> String {
    match (quantity, unit) {
        (Some(q), Some(u)) => format!("{} {u}", no_neg_zero(q)),
        (Some(q), None) => format!("{}", no_neg_zero(q)),
        (None, Some(u)) => u.to_string(),
        (None, None) => "-".to_string(),
    }
}

pub(crate) fn stock_mark(in_stock: bool) -> &'static str {
    if in_stock { "yes" } else { "no" }
}

pub(crate) fn print_product_table(products: &[&Product]) {
    #[derive(Tabled)]
    struct ProductRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "In stock")]
        in_stock: &'static str,
        #[tabled(rename = "Stores")]
        stores: String,
    }

    let rows: Vec<ProductRow> = products
        .iter()
        .enumerate()
        .map(|(i, p)| ProductRow {
            idx: i + 1,
            id: p.id,
            name: truncate(&p.name, 35),
            amount: format_amount(p.quantity, p.unit.as_deref()),
            in_stock: stock_mark(p.in_stock),
            stores: truncate(
                &p.stores
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                30,
            ),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_ingredient_table(detail: &RecipeDetail) {
    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "In stock")]
        in_stock: &'static str,
    }

    let rows: Vec<IngredientRow> = detail
        .ingredients
        .iter()
        .map(|i| IngredientRow {
            name: truncate(&i.product_name, 35),
            amount: format_amount(i.quantity, i.unit.as_deref()),
            in_stock: stock_mark(i.in_stock),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredient_with_unit() {
        let spec = parse_ingredient("Eggs:3 units").unwrap();
        assert_eq!(
            spec,
            IngredientSpec {
                product: "Eggs".to_string(),
                quantity: Some(3.0),
                unit: Some("units".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_ingredient_compact_unit() {
        let spec = parse_ingredient("Cheese:50g").unwrap();
        assert_eq!(spec.product, "Cheese");
        assert_eq!(spec.quantity, Some(50.0));
        assert_eq!(spec.unit.as_deref(), Some("g"));

        let spec = parse_ingredient("Milk : 0.5L").unwrap();
        assert_eq!(spec.product, "Milk");
        assert_eq!(spec.quantity, Some(0.5));
        assert_eq!(spec.unit.as_deref(), Some("L"));
    }

    #[test]
    fn test_parse_ingredient_name_only() {
        let spec = parse_ingredient("Chicken Breast").unwrap();
        assert_eq!(spec.product, "Chicken Breast");
        assert_eq!(spec.quantity, None);
        assert_eq!(spec.unit, None);

        let spec = parse_ingredient("Onions:").unwrap();
        assert_eq!(spec.quantity, None);
    }

    #[test]
    fn test_parse_ingredient_plain_number() {
        let spec = parse_ingredient("Onions:2").unwrap();
        assert_eq!(spec.quantity, Some(2.0));
        assert_eq!(spec.unit, None);
    }

    #[test]
    fn test_parse_ingredient_invalid() {
        assert!(parse_ingredient(":3 units").is_err());
        assert!(parse_ingredient("Eggs:lots").is_err());
        assert!(parse_ingredient("Eggs:-2").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Some(250.0), Some("g")), "250 g");
        assert_eq!(format_amount(Some(1.5), None), "1.5");
        assert_eq!(format_amount(None, Some("pinch")), "pinch");
        assert_eq!(format_amount(None, None), "-");
        assert_eq!(format_amount(Some(-0.0), Some("g")), "0 g");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(
            json_error("Product 3 not found"),
            r#"{"error":"Product 3 not found"}"#
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        // Should not panic on multi-byte characters
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }
}
