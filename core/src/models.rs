use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::period::MealPeriod;

// --- Stores ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub photo: Option<String>,
    pub maps_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStore {
    pub name: String,
    pub photo: Option<String>,
    pub maps_url: Option<String>,
    pub notes: Option<String>,
}

/// Store reference embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRef {
    pub id: i64,
    pub name: String,
}

// --- Products ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub photo: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub in_stock: bool,
    pub notes: Option<String>,
    pub stores: Vec<StoreRef>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub photo: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    #[serde(default)]
    pub store_ids: Vec<i64>,
    #[serde(default)]
    pub in_stock: bool,
    pub notes: Option<String>,
}

/// Filters for listing products. Empty `store_ids` means any store.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub store_ids: Vec<i64>,
    pub in_stock: Option<bool>,
}

// --- Recipes ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub photo: Option<String>,
    pub prep_time: u32,
    pub cook_time: u32,
    pub meal_type: MealPeriod,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One ingredient line. Quantity and unit belong to the recipe, not the product;
/// `in_stock` is read through from the product at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub in_stock: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
}

impl RecipeDetail {
    /// Ingredients whose product is currently out of stock.
    pub fn missing_ingredients(&self) -> impl Iterator<Item = &RecipeIngredient> {
        self.ingredients.iter().filter(|i| !i.in_stock)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub product_id: i64,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub photo: Option<String>,
    #[serde(default)]
    pub prep_time: u32,
    #[serde(default)]
    pub cook_time: u32,
    pub meal_type: MealPeriod,
    pub notes: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<NewIngredient>,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub search: Option<String>,
    pub meal_type: Option<MealPeriod>,
}

// --- History, shopping list, recent items ---

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionRecord {
    pub id: i64,
    pub recipe_id: i64,
    pub suggested_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShoppingListEntry {
    pub id: i64,
    pub product_id: i64,
    pub added_at: String,
    pub product: Product,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentItem {
    pub product_id: i64,
    pub last_used: String,
    pub product: Product,
}

/// A proposed meal for the current period.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub meal_period: MealPeriod,
    /// True when every candidate had been suggested within the exclusion
    /// window and the pick was drawn from the full period list instead.
    pub repeated: bool,
    #[serde(flatten)]
    pub recipe: RecipeDetail,
}

// --- Validation ---

pub(crate) fn validate_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid(format!("{kind} name must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_quantity(quantity: Option<f64>) -> Result<()> {
    match quantity {
        Some(q) if !q.is_finite() || q < 0.0 => Err(CoreError::invalid(
            "quantity must be a non-negative number",
        )),
        _ => Ok(()),
    }
}

/// Blank optional strings are stored as NULL.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn validate_new_product(product: &NewProduct) -> Result<String> {
    let name = validate_name("Product", &product.name)?;
    validate_quantity(product.quantity)?;
    Ok(name)
}

pub(crate) fn validate_new_recipe(recipe: &NewRecipe) -> Result<String> {
    let name = validate_name("Recipe", &recipe.name)?;
    for ing in &recipe.ingredients {
        validate_quantity(ing.quantity)?;
    }
    Ok(name)
}
