use anyhow::{Context, Result};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::MealPeriod;
use larder_core::db::Database;
use larder_core::models::{NewIngredient, NewRecipe, RecipeFilter};

use super::helpers::{json_error, parse_ingredient, print_ingredient_table, truncate};
use super::{resolve_product, resolve_recipe};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_recipe_add(
    db: &Database,
    name: &str,
    meal: &str,
    prep: u32,
    cook: u32,
    ingredients: &[String],
    photo: Option<String>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let meal_type: MealPeriod = meal.parse()?;

    let mut lines = Vec::with_capacity(ingredients.len());
    for raw in ingredients {
        let spec = parse_ingredient(raw)?;
        let product = resolve_product(db, &spec.product)
            .with_context(|| format!("Could not resolve ingredient '{raw}'"))?;
        lines.push(NewIngredient {
            product_id: product.id,
            quantity: spec.quantity,
            unit: spec.unit,
        });
    }

    let detail = db.insert_recipe(&NewRecipe {
        name: name.to_string(),
        photo,
        prep_time: prep,
        cook_time: cook,
        meal_type,
        notes,
        ingredients: lines,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        let (name, id) = (&detail.recipe.name, detail.recipe.id);
        let count = detail.ingredients.len();
        println!("Created {meal_type} recipe: {name} (id: {id}, {count} ingredients)");
    }
    Ok(())
}

pub(crate) fn cmd_recipe_list(
    db: &Database,
    search: Option<String>,
    meal: Option<&str>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Meal")]
        meal: &'static str,
        #[tabled(rename = "Prep")]
        prep: String,
        #[tabled(rename = "Cook")]
        cook: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
        #[tabled(rename = "Missing")]
        missing: usize,
    }

    let meal_type = meal.map(str::parse::<MealPeriod>).transpose()?;
    let recipes = db.list_recipes(&RecipeFilter { search, meal_type })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }
    if recipes.is_empty() {
        eprintln!("No recipes found");
        return Ok(());
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|d| RecipeRow {
            id: d.recipe.id,
            name: truncate(&d.recipe.name, 35),
            meal: d.recipe.meal_type.label(),
            prep: format!("{} min", d.recipe.prep_time),
            cook: format!("{} min", d.recipe.cook_time),
            ingredients: d.ingredients.len(),
            missing: d.missing_ingredients().count(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_recipe_show(db: &Database, recipe: &str, json: bool) -> Result<()> {
    let recipe = match resolve_recipe(db, recipe) {
        Ok(r) => r,
        Err(e) => {
            if json {
                println!("{}", json_error(&e.to_string()));
            } else {
                eprintln!("{e}");
            }
            process::exit(2);
        }
    };
    let detail = db.get_recipe_detail(recipe.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let r = &detail.recipe;
    let (name, meal, prep, cook) = (&r.name, r.meal_type.label(), r.prep_time, r.cook_time);
    println!("{name} ({meal})");
    println!("Prep {prep} min, cook {cook} min");
    if let Some(notes) = &r.notes {
        println!("{notes}");
    }
    if detail.ingredients.is_empty() {
        println!("\nNo ingredients");
    } else {
        println!();
        print_ingredient_table(&detail);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_delete(db: &Database, recipe: &str, json: bool) -> Result<()> {
    let recipe = match resolve_recipe(db, recipe) {
        Ok(r) => r,
        Err(e) => {
            if json {
                println!("{}", json_error(&e.to_string()));
            } else {
                eprintln!("{e}");
            }
            process::exit(2);
        }
    };

    db.delete_recipe(recipe.id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": recipe.id }));
    } else {
        let (name, id) = (&recipe.name, recipe.id);
        println!("Deleted recipe: {name} (id: {id})");
    }
    Ok(())
}
