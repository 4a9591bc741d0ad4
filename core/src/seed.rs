use std::collections::HashMap;

use serde::Serialize;

use crate::db::Database;
use crate::error::{CoreError, Result};
use crate::models::{NewIngredient, NewProduct, NewRecipe, NewStore};
use crate::period::MealPeriod;

struct StoreSeed {
    name: &'static str,
    maps_query: &'static str,
    notes: &'static str,
}

struct ProductSeed {
    name: &'static str,
    quantity: f64,
    unit: &'static str,
    store: &'static str,
    in_stock: bool,
    notes: &'static str,
}

struct RecipeSeed {
    name: &'static str,
    prep_time: u32,
    cook_time: u32,
    meal_type: MealPeriod,
    notes: &'static str,
    ingredients: &'static [(&'static str, f64, &'static str)],
}

const STORES: &[StoreSeed] = &[
    StoreSeed {
        name: "Walmart",
        maps_query: "Walmart",
        notes: "Main grocery store",
    },
    StoreSeed {
        name: "Whole Foods",
        maps_query: "Whole+Foods",
        notes: "Organic products",
    },
    StoreSeed {
        name: "Costco",
        maps_query: "Costco",
        notes: "Bulk shopping",
    },
];

const PRODUCTS: &[ProductSeed] = &[
    ProductSeed {
        name: "Eggs",
        quantity: 12.0,
        unit: "units",
        store: "Walmart",
        in_stock: true,
        notes: "Free range",
    },
    ProductSeed {
        name: "Milk",
        quantity: 1.0,
        unit: "L",
        store: "Walmart",
        in_stock: true,
        notes: "Whole milk",
    },
    ProductSeed {
        name: "Flour",
        quantity: 1.0,
        unit: "kg",
        store: "Whole Foods",
        in_stock: true,
        notes: "All-purpose",
    },
    ProductSeed {
        name: "Butter",
        quantity: 250.0,
        unit: "g",
        store: "Walmart",
        in_stock: true,
        notes: "Unsalted",
    },
    ProductSeed {
        name: "Sugar",
        quantity: 1.0,
        unit: "kg",
        store: "Costco",
        in_stock: false,
        notes: "White sugar",
    },
    ProductSeed {
        name: "Chicken Breast",
        quantity: 500.0,
        unit: "g",
        store: "Walmart",
        in_stock: true,
        notes: "Fresh",
    },
    ProductSeed {
        name: "Rice",
        quantity: 1.0,
        unit: "kg",
        store: "Costco",
        in_stock: true,
        notes: "Basmati",
    },
    ProductSeed {
        name: "Tomatoes",
        quantity: 500.0,
        unit: "g",
        store: "Whole Foods",
        in_stock: true,
        notes: "Organic",
    },
    ProductSeed {
        name: "Onions",
        quantity: 3.0,
        unit: "units",
        store: "Whole Foods",
        in_stock: true,
        notes: "Yellow onions",
    },
    ProductSeed {
        name: "Pasta",
        quantity: 500.0,
        unit: "g",
        store: "Costco",
        in_stock: false,
        notes: "Spaghetti",
    },
    ProductSeed {
        name: "Cheese",
        quantity: 200.0,
        unit: "g",
        store: "Walmart",
        in_stock: true,
        notes: "Cheddar",
    },
    ProductSeed {
        name: "Bread",
        quantity: 1.0,
        unit: "units",
        store: "Whole Foods",
        in_stock: false,
        notes: "Whole wheat",
    },
];

const RECIPES: &[RecipeSeed] = &[
    RecipeSeed {
        name: "Cheese Omelette",
        prep_time: 5,
        cook_time: 10,
        meal_type: MealPeriod::Breakfast,
        notes: "Quick and easy breakfast",
        ingredients: &[
            ("Eggs", 3.0, "units"),
            ("Cheese", 50.0, "g"),
            ("Butter", 10.0, "g"),
        ],
    },
    RecipeSeed {
        name: "Pancakes",
        prep_time: 10,
        cook_time: 20,
        meal_type: MealPeriod::Breakfast,
        notes: "Fluffy pancakes",
        ingredients: &[
            ("Flour", 250.0, "g"),
            ("Eggs", 2.0, "units"),
            ("Milk", 300.0, "ml"),
            ("Butter", 50.0, "g"),
        ],
    },
    RecipeSeed {
        name: "Chicken with Rice",
        prep_time: 15,
        cook_time: 30,
        meal_type: MealPeriod::Lunch,
        notes: "Healthy and filling",
        ingredients: &[
            ("Chicken Breast", 400.0, "g"),
            ("Rice", 200.0, "g"),
            ("Onions", 1.0, "units"),
        ],
    },
    RecipeSeed {
        name: "Pasta with Tomato Sauce",
        prep_time: 10,
        cook_time: 15,
        meal_type: MealPeriod::Lunch,
        notes: "Classic Italian",
        ingredients: &[
            ("Pasta", 300.0, "g"),
            ("Tomatoes", 400.0, "g"),
            ("Onions", 1.0, "units"),
            ("Cheese", 50.0, "g"),
        ],
    },
    RecipeSeed {
        name: "Grilled Chicken with Vegetables",
        prep_time: 20,
        cook_time: 40,
        meal_type: MealPeriod::Dinner,
        notes: "Healthy dinner option",
        ingredients: &[
            ("Chicken Breast", 500.0, "g"),
            ("Tomatoes", 300.0, "g"),
            ("Onions", 2.0, "units"),
        ],
    },
    RecipeSeed {
        name: "Vegetable Omelette",
        prep_time: 10,
        cook_time: 15,
        meal_type: MealPeriod::Dinner,
        notes: "Light dinner",
        ingredients: &[
            ("Eggs", 4.0, "units"),
            ("Tomatoes", 200.0, "g"),
            ("Onions", 1.0, "units"),
            ("Cheese", 100.0, "g"),
        ],
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub stores: usize,
    pub products: usize,
    pub recipes: usize,
}

/// Load the sample household into an empty database.
///
/// Returns `None` without touching anything when any store already exists.
pub fn seed_sample_data(db: &Database) -> Result<Option<SeedSummary>> {
    db.atomically(|db| {
        if db.count_stores()? > 0 {
            tracing::info!("database already has stores, skipping seed");
            return Ok(None);
        }

        let mut store_ids = HashMap::new();
        for s in STORES {
            let store = db.insert_store(&NewStore {
                name: s.name.to_string(),
                photo: None,
                maps_url: Some(format!("https://maps.google.com/?q={}", s.maps_query)),
                notes: Some(s.notes.to_string()),
            })?;
            store_ids.insert(s.name, store.id);
        }

        let mut product_ids = HashMap::new();
        for p in PRODUCTS {
            let store_id = lookup(&store_ids, p.store)?;
            let product = db.insert_product(&NewProduct {
                name: p.name.to_string(),
                photo: None,
                quantity: Some(p.quantity),
                unit: Some(p.unit.to_string()),
                store_ids: vec![store_id],
                in_stock: p.in_stock,
                notes: Some(p.notes.to_string()),
            })?;
            product_ids.insert(p.name, product.id);
        }

        for r in RECIPES {
            let ingredients = r
                .ingredients
                .iter()
                .map(|&(name, quantity, unit)| {
                    Ok(NewIngredient {
                        product_id: lookup(&product_ids, name)?,
                        quantity: Some(quantity),
                        unit: Some(unit.to_string()),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            db.insert_recipe(&NewRecipe {
                name: r.name.to_string(),
                photo: None,
                prep_time: r.prep_time,
                cook_time: r.cook_time,
                meal_type: r.meal_type,
                notes: Some(r.notes.to_string()),
                ingredients,
            })?;
        }

        let summary = SeedSummary {
            stores: STORES.len(),
            products: PRODUCTS.len(),
            recipes: RECIPES.len(),
        };
        tracing::info!(?summary, "seeded sample data");
        Ok(Some(summary))
    })
}

fn lookup(ids: &HashMap<&str, i64>, name: &str) -> Result<i64> {
    ids.get(name)
        .copied()
        .ok_or_else(|| CoreError::invalid(format!("seed data references unknown name '{name}'")))
}
