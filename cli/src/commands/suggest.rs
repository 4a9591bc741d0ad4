use anyhow::Result;
use std::process;

use larder_core::{CoreError, PlannerService};

use super::helpers::{json_error, print_ingredient_table};

pub(crate) fn cmd_suggest(service: &mut PlannerService, json: bool) -> Result<()> {
    let suggestion = match service.suggest() {
        Ok(s) => s,
        Err(e @ CoreError::NoRecipesForPeriod(period)) => {
            if json {
                println!("{}", json_error(&e.to_string()));
            } else {
                eprintln!("{e}. Add one with: larder recipe add <name> --meal {period}");
            }
            process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestion)?);
        return Ok(());
    }

    let period = suggestion.meal_period.label();
    let detail = &suggestion.recipe;
    let name = &detail.recipe.name;
    let prep = detail.recipe.prep_time;
    let cook = detail.recipe.cook_time;
    println!("{period}: {name}");
    println!("Prep {prep} min, cook {cook} min");
    if suggestion.repeated {
        let meal = suggestion.meal_period;
        println!("Every {meal} recipe was suggested recently, so this one is a repeat.");
    }
    if let Some(notes) = &detail.recipe.notes {
        println!("{notes}");
    }

    if detail.ingredients.is_empty() {
        return Ok(());
    }
    println!();
    print_ingredient_table(detail);

    let missing: Vec<&str> = detail
        .missing_ingredients()
        .map(|i| i.product_name.as_str())
        .collect();
    if !missing.is_empty() {
        let list = missing.join(", ");
        println!("\nOut of stock: {list}");
        println!("Add to the shopping list with: larder list add <product>");
    }

    Ok(())
}
