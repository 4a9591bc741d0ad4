mod helpers;
mod list;
mod product;
mod recipe;
mod search;
mod seed;
mod store;
mod suggest;

use anyhow::{Result, bail};

use larder_core::db::Database;
use larder_core::models::{Product, ProductFilter, Recipe, RecipeFilter, Store};

use helpers::{print_product_table, prompt_choice};

pub(crate) use list::{cmd_list_add, cmd_list_remove, cmd_list_show, cmd_recent};
pub(crate) use product::{
    cmd_product_add, cmd_product_delete, cmd_product_list, cmd_product_show, cmd_product_stock,
};
pub(crate) use recipe::{cmd_recipe_add, cmd_recipe_delete, cmd_recipe_list, cmd_recipe_show};
pub(crate) use search::cmd_search;
pub(crate) use seed::cmd_seed;
pub(crate) use store::{cmd_store_add, cmd_store_delete, cmd_store_list};
pub(crate) use suggest::cmd_suggest;

/// Resolve a product by id, exact name, or name fragment. Prompts when a
/// fragment matches more than one product.
pub(super) fn resolve_product(db: &Database, query: &str) -> Result<Product> {
    if let Ok(id) = query.trim().parse::<i64>() {
        return Ok(db.get_product(id)?);
    }

    let mut exact = db.find_products_by_name(query)?;
    if exact.len() == 1 {
        return Ok(exact.remove(0));
    }

    let mut all = if exact.is_empty() {
        db.list_products(&ProductFilter {
            search: Some(query.to_string()),
            ..ProductFilter::default()
        })?
    } else {
        exact
    };

    match all.len() {
        0 => bail!("No product found for '{query}'"),
        1 => Ok(all.remove(0)),
        n => {
            let refs: Vec<&Product> = all.iter().collect();
            print_product_table(&refs);
            let idx = prompt_choice(n, "product")?;
            Ok(all.swap_remove(idx))
        }
    }
}

/// Resolve a recipe by id, exact name, or name fragment.
pub(super) fn resolve_recipe(db: &Database, query: &str) -> Result<Recipe> {
    if let Ok(id) = query.trim().parse::<i64>() {
        return Ok(db.get_recipe(id)?);
    }

    let mut exact = db.find_recipes_by_name(query)?;
    if exact.len() == 1 {
        return Ok(exact.remove(0));
    }

    let mut all: Vec<Recipe> = if exact.is_empty() {
        db.list_recipes(&RecipeFilter {
            search: Some(query.to_string()),
            meal_type: None,
        })?
        .into_iter()
        .map(|d| d.recipe)
        .collect()
    } else {
        exact
    };

    match all.len() {
        0 => bail!("No recipe found for '{query}'"),
        1 => Ok(all.remove(0)),
        n => {
            for (i, r) in all.iter().enumerate() {
                let (idx, id, name, meal) = (i + 1, r.id, &r.name, r.meal_type);
                eprintln!("  {idx}. {name} ({meal}, id: {id})");
            }
            let idx = prompt_choice(n, "recipe")?;
            Ok(all.swap_remove(idx))
        }
    }
}

/// Resolve a store by id or case-insensitive name.
pub(super) fn resolve_store(db: &Database, query: &str) -> Result<Store> {
    if let Ok(id) = query.trim().parse::<i64>() {
        return Ok(db.get_store(id)?);
    }
    let wanted = query.trim().to_lowercase();
    db.list_stores()?
        .into_iter()
        .find(|s| s.name.to_lowercase() == wanted)
        .ok_or_else(|| anyhow::anyhow!("No store named '{query}'"))
}
