use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{
    Connection, OptionalExtension, Transaction, TransactionBehavior, params, params_from_iter,
};

use crate::clock::timestamp;
use crate::error::{CoreError, Result};
use crate::models::{
    NewProduct, NewRecipe, NewStore, Product, ProductFilter, RecentItem, Recipe, RecipeDetail,
    RecipeFilter, RecipeIngredient, ShoppingListEntry, Store, StoreRef, SuggestionRecord,
    non_blank, validate_name, validate_new_product, validate_new_recipe,
};
use crate::period::MealPeriod;

const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.photo, p.quantity, p.unit, p.in_stock, p.notes, p.created_at, p.updated_at";

const RECIPE_COLUMNS: &str =
    "r.id, r.name, r.photo, r.prep_time, r.cook_time, r.meal_type, r.notes, r.created_at, r.updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS stores (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    photo TEXT,
                    maps_url TEXT,
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS products (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    photo TEXT,
                    quantity REAL,
                    unit TEXT,
                    in_stock INTEGER NOT NULL DEFAULT 0,
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS product_stores (
                    product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                    store_id INTEGER NOT NULL REFERENCES stores(id) ON DELETE CASCADE,
                    PRIMARY KEY (product_id, store_id)
                );

                CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    photo TEXT,
                    prep_time INTEGER NOT NULL DEFAULT 0 CHECK (prep_time >= 0),
                    cook_time INTEGER NOT NULL DEFAULT 0 CHECK (cook_time >= 0),
                    meal_type TEXT NOT NULL CHECK (meal_type IN ('breakfast', 'lunch', 'dinner')),
                    notes TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recipe_ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                    product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                    position INTEGER NOT NULL,
                    quantity REAL,
                    unit TEXT
                );

                CREATE TABLE IF NOT EXISTS suggestion_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                    suggested_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS shopping_list (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    product_id INTEGER NOT NULL UNIQUE REFERENCES products(id) ON DELETE CASCADE,
                    added_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recent_items (
                    product_id INTEGER PRIMARY KEY REFERENCES products(id) ON DELETE CASCADE,
                    last_used TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);
                CREATE INDEX IF NOT EXISTS idx_product_stores_store ON product_stores(store_id);
                CREATE INDEX IF NOT EXISTS idx_recipes_meal_type ON recipes(meal_type);
                CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
                CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_product ON recipe_ingredients(product_id);
                CREATE INDEX IF NOT EXISTS idx_suggestion_history_at ON suggestion_history(suggested_at);
                CREATE INDEX IF NOT EXISTS idx_recent_items_last_used ON recent_items(last_used);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    /// Run `f` as one `BEGIN IMMEDIATE` transaction, rolling back if it fails.
    ///
    /// Calls made while a transaction is already open join it instead of
    /// starting a nested one.
    pub fn atomically<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        if !self.conn.is_autocommit() {
            return f(self);
        }
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    fn now() -> String {
        timestamp(&Utc::now())
    }

    // --- Row mapping helpers ---

    fn store_from_row(row: &rusqlite::Row) -> rusqlite::Result<Store> {
        Ok(Store {
            id: row.get(0)?,
            name: row.get(1)?,
            photo: row.get(2)?,
            maps_url: row.get(3)?,
            notes: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    // Expects PRODUCT_COLUMNS starting at `base`. Stores are attached separately.
    fn product_from_row(row: &rusqlite::Row, base: usize) -> rusqlite::Result<Product> {
        Ok(Product {
            id: row.get(base)?,
            name: row.get(base + 1)?,
            photo: row.get(base + 2)?,
            quantity: row.get(base + 3)?,
            unit: row.get(base + 4)?,
            in_stock: row.get(base + 5)?,
            notes: row.get(base + 6)?,
            stores: Vec::new(),
            created_at: row.get(base + 7)?,
            updated_at: row.get(base + 8)?,
        })
    }

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            photo: row.get(2)?,
            prep_time: row.get(3)?,
            cook_time: row.get(4)?,
            meal_type: row.get(5)?,
            notes: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn suggestion_from_row(row: &rusqlite::Row) -> rusqlite::Result<SuggestionRecord> {
        Ok(SuggestionRecord {
            id: row.get(0)?,
            recipe_id: row.get(1)?,
            suggested_at: row.get(2)?,
        })
    }

    fn stores_for_product(&self, product_id: i64) -> Result<Vec<StoreRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name FROM product_stores ps
             JOIN stores s ON ps.store_id = s.id
             WHERE ps.product_id = ?1
             ORDER BY s.name",
        )?;
        let stores = stmt
            .query_map(params![product_id], |row| {
                Ok(StoreRef {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stores)
    }

    fn attach_stores(&self, mut products: Vec<Product>) -> Result<Vec<Product>> {
        for p in &mut products {
            p.stores = self.stores_for_product(p.id)?;
        }
        Ok(products)
    }

    // --- Stores ---

    pub fn insert_store(&self, store: &NewStore) -> Result<Store> {
        let name = validate_name("Store", &store.name)?;
        let now = Self::now();
        self.conn.execute(
            "INSERT INTO stores (name, photo, maps_url, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                non_blank(store.photo.as_deref()),
                non_blank(store.maps_url.as_deref()),
                non_blank(store.notes.as_deref()),
                now,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_store(id)
    }

    pub fn get_store(&self, id: i64) -> Result<Store> {
        self.conn
            .query_row(
                "SELECT id, name, photo, maps_url, notes, created_at, updated_at FROM stores WHERE id = ?1",
                params![id],
                Self::store_from_row,
            )
            .optional()?
            .ok_or_else(|| CoreError::not_found("Store", id))
    }

    pub fn list_stores(&self) -> Result<Vec<Store>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, photo, maps_url, notes, created_at, updated_at FROM stores ORDER BY name, id",
        )?;
        let stores = stmt
            .query_map([], Self::store_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stores)
    }

    pub fn update_store(&self, id: i64, store: &NewStore) -> Result<Store> {
        let name = validate_name("Store", &store.name)?;
        let rows = self.conn.execute(
            "UPDATE stores SET name = ?1, photo = ?2, maps_url = ?3, notes = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                name,
                non_blank(store.photo.as_deref()),
                non_blank(store.maps_url.as_deref()),
                non_blank(store.notes.as_deref()),
                Self::now(),
                id,
            ],
        )?;
        if rows == 0 {
            return Err(CoreError::not_found("Store", id));
        }
        self.get_store(id)
    }

    /// Deletes the store and its product links. Products themselves survive.
    pub fn delete_store(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM stores WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn count_stores(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM stores", [], |row| row.get(0))?)
    }

    // --- Products ---

    fn ensure_stores_exist(&self, store_ids: &[i64]) -> Result<()> {
        for &store_id in store_ids {
            let exists: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM stores WHERE id = ?1)",
                params![store_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(CoreError::not_found("Store", store_id));
            }
        }
        Ok(())
    }

    fn replace_product_stores(&self, product_id: i64, store_ids: &[i64]) -> Result<()> {
        self.ensure_stores_exist(store_ids)?;
        self.conn.execute(
            "DELETE FROM product_stores WHERE product_id = ?1",
            params![product_id],
        )?;
        for store_id in store_ids {
            self.conn.execute(
                "INSERT OR IGNORE INTO product_stores (product_id, store_id) VALUES (?1, ?2)",
                params![product_id, store_id],
            )?;
        }
        Ok(())
    }

    pub fn insert_product(&self, product: &NewProduct) -> Result<Product> {
        let name = validate_new_product(product)?;
        self.atomically(|db| {
            let now = Self::now();
            db.conn.execute(
                "INSERT INTO products (name, photo, quantity, unit, in_stock, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    name,
                    non_blank(product.photo.as_deref()),
                    product.quantity,
                    non_blank(product.unit.as_deref()),
                    product.in_stock,
                    non_blank(product.notes.as_deref()),
                    now,
                    now,
                ],
            )?;
            let id = db.conn.last_insert_rowid();
            db.replace_product_stores(id, &product.store_ids)?;
            db.get_product(id)
        })
    }

    pub fn get_product(&self, id: i64) -> Result<Product> {
        let product = self
            .conn
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1"),
                params![id],
                |row| Self::product_from_row(row, 0),
            )
            .optional()?
            .ok_or_else(|| CoreError::not_found("Product", id))?;
        let stores = self.stores_for_product(product.id)?;
        Ok(Product { stores, ..product })
    }

    pub fn product_exists(&self, id: i64) -> Result<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?)
    }

    pub fn find_products_by_name(&self, name: &str) -> Result<Vec<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE LOWER(p.name) = LOWER(?1) ORDER BY p.id"
        ))?;
        let products = stmt
            .query_map(params![name.trim()], |row| Self::product_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_stores(products)
    }

    pub fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE 1 = 1");
        let mut values: Vec<Value> = Vec::new();

        if let Some(search) = non_blank(filter.search.as_deref()) {
            values.push(Value::Text(like_pattern(&search)));
            sql.push_str(&format!(" AND p.name LIKE ?{} ESCAPE '\\'", values.len()));
        }
        if !filter.store_ids.is_empty() {
            let mut placeholders = Vec::with_capacity(filter.store_ids.len());
            for id in &filter.store_ids {
                values.push(Value::Integer(*id));
                placeholders.push(format!("?{}", values.len()));
            }
            sql.push_str(&format!(
                " AND p.id IN (SELECT product_id FROM product_stores WHERE store_id IN ({}))",
                placeholders.join(", ")
            ));
        }
        if let Some(in_stock) = filter.in_stock {
            values.push(Value::Integer(i64::from(in_stock)));
            sql.push_str(&format!(" AND p.in_stock = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY p.name, p.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let products = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Self::product_from_row(row, 0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_stores(products)
    }

    pub fn update_product(&self, id: i64, product: &NewProduct) -> Result<Product> {
        let name = validate_new_product(product)?;
        self.atomically(|db| {
            let rows = db.conn.execute(
                "UPDATE products SET name = ?1, photo = ?2, quantity = ?3, unit = ?4, in_stock = ?5,
                        notes = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    name,
                    non_blank(product.photo.as_deref()),
                    product.quantity,
                    non_blank(product.unit.as_deref()),
                    product.in_stock,
                    non_blank(product.notes.as_deref()),
                    Self::now(),
                    id,
                ],
            )?;
            if rows == 0 {
                return Err(CoreError::not_found("Product", id));
            }
            db.replace_product_stores(id, &product.store_ids)?;
            db.get_product(id)
        })
    }

    pub fn set_product_in_stock(&self, id: i64, in_stock: bool) -> Result<Product> {
        let rows = self.conn.execute(
            "UPDATE products SET in_stock = ?1, updated_at = ?2 WHERE id = ?3",
            params![in_stock, Self::now(), id],
        )?;
        if rows == 0 {
            return Err(CoreError::not_found("Product", id));
        }
        self.get_product(id)
    }

    /// Deletes the product. Its shopping-list entry, recent item, store links
    /// and every recipe ingredient line referencing it go with it.
    pub fn delete_product(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Recipes ---

    fn insert_ingredients(&self, recipe_id: i64, recipe: &NewRecipe) -> Result<()> {
        for (position, ing) in recipe.ingredients.iter().enumerate() {
            if !self.product_exists(ing.product_id)? {
                return Err(CoreError::not_found("Product", ing.product_id));
            }
            self.conn.execute(
                "INSERT INTO recipe_ingredients (recipe_id, product_id, position, quantity, unit)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    recipe_id,
                    ing.product_id,
                    position as i64,
                    ing.quantity,
                    non_blank(ing.unit.as_deref()),
                ],
            )?;
        }
        Ok(())
    }

    pub fn insert_recipe(&self, recipe: &NewRecipe) -> Result<RecipeDetail> {
        let name = validate_new_recipe(recipe)?;
        self.atomically(|db| {
            let now = Self::now();
            db.conn.execute(
                "INSERT INTO recipes (name, photo, prep_time, cook_time, meal_type, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    name,
                    non_blank(recipe.photo.as_deref()),
                    recipe.prep_time,
                    recipe.cook_time,
                    recipe.meal_type,
                    non_blank(recipe.notes.as_deref()),
                    now,
                    now,
                ],
            )?;
            let id = db.conn.last_insert_rowid();
            db.insert_ingredients(id, recipe)?;
            db.get_recipe_detail(id)
        })
    }

    pub fn get_recipe(&self, id: i64) -> Result<Recipe> {
        self.conn
            .query_row(
                &format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = ?1"),
                params![id],
                Self::recipe_from_row,
            )
            .optional()?
            .ok_or_else(|| CoreError::not_found("Recipe", id))
    }

    /// Ingredient lines in recipe order, each carrying its product's current
    /// stock flag.
    pub fn get_recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT ri.id, ri.product_id, p.name, ri.quantity, ri.unit, p.in_stock
             FROM recipe_ingredients ri
             JOIN products p ON ri.product_id = p.id
             WHERE ri.recipe_id = ?1
             ORDER BY ri.position, ri.id",
        )?;
        let ingredients = stmt
            .query_map(params![recipe_id], |row| {
                Ok(RecipeIngredient {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    product_name: row.get(2)?,
                    quantity: row.get(3)?,
                    unit: row.get(4)?,
                    in_stock: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    pub fn get_recipe_detail(&self, id: i64) -> Result<RecipeDetail> {
        let recipe = self.get_recipe(id)?;
        let ingredients = self.get_recipe_ingredients(id)?;
        Ok(RecipeDetail {
            recipe,
            ingredients,
        })
    }

    pub fn find_recipes_by_name(&self, name: &str) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE LOWER(r.name) = LOWER(?1) ORDER BY r.id"
        ))?;
        let recipes = stmt
            .query_map(params![name.trim()], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn list_recipes(&self, filter: &RecipeFilter) -> Result<Vec<RecipeDetail>> {
        let mut sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE 1 = 1");
        let mut values: Vec<Value> = Vec::new();

        if let Some(search) = non_blank(filter.search.as_deref()) {
            values.push(Value::Text(like_pattern(&search)));
            sql.push_str(&format!(" AND r.name LIKE ?{} ESCAPE '\\'", values.len()));
        }
        if let Some(period) = filter.meal_type {
            values.push(Value::Text(period.as_str().to_string()));
            sql.push_str(&format!(" AND r.meal_type = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY r.name, r.id");

        let recipes = {
            let mut stmt = self.conn.prepare(&sql)?;
            stmt.query_map(params_from_iter(values.iter()), Self::recipe_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };
        recipes
            .into_iter()
            .map(|recipe| {
                let ingredients = self.get_recipe_ingredients(recipe.id)?;
                Ok(RecipeDetail {
                    recipe,
                    ingredients,
                })
            })
            .collect()
    }

    /// Every recipe tagged with `period`, in id order.
    pub fn recipes_for_period(&self, period: MealPeriod) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.meal_type = ?1 ORDER BY r.id"
        ))?;
        let recipes = stmt
            .query_map(params![period], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    /// Replaces the recipe's fields and its ingredient lines wholesale.
    pub fn update_recipe(&self, id: i64, recipe: &NewRecipe) -> Result<RecipeDetail> {
        let name = validate_new_recipe(recipe)?;
        self.atomically(|db| {
            let rows = db.conn.execute(
                "UPDATE recipes SET name = ?1, photo = ?2, prep_time = ?3, cook_time = ?4,
                        meal_type = ?5, notes = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    name,
                    non_blank(recipe.photo.as_deref()),
                    recipe.prep_time,
                    recipe.cook_time,
                    recipe.meal_type,
                    non_blank(recipe.notes.as_deref()),
                    Self::now(),
                    id,
                ],
            )?;
            if rows == 0 {
                return Err(CoreError::not_found("Recipe", id));
            }
            db.conn.execute(
                "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
                params![id],
            )?;
            db.insert_ingredients(id, recipe)?;
            db.get_recipe_detail(id)
        })
    }

    /// Deletes the recipe with its ingredient lines and suggestion history.
    pub fn delete_recipe(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Suggestion history ---

    /// Appends a history row. The stored timestamp never goes backwards: if
    /// `at` is older than the newest record, the newest record's time is used.
    pub fn insert_suggestion(&self, recipe_id: i64, at: &str) -> Result<SuggestionRecord> {
        let latest: Option<String> = self.conn.query_row(
            "SELECT MAX(suggested_at) FROM suggestion_history",
            [],
            |row| row.get(0),
        )?;
        let suggested_at = match latest {
            Some(latest) if latest.as_str() > at => latest,
            _ => at.to_string(),
        };
        self.conn.execute(
            "INSERT INTO suggestion_history (recipe_id, suggested_at) VALUES (?1, ?2)",
            params![recipe_id, suggested_at],
        )?;
        Ok(SuggestionRecord {
            id: self.conn.last_insert_rowid(),
            recipe_id,
            suggested_at,
        })
    }

    /// Recipe ids with at least one record at or after `since`.
    pub fn suggested_recipe_ids_since(&self, since: &str) -> Result<HashSet<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT recipe_id FROM suggestion_history WHERE suggested_at >= ?1",
        )?;
        let ids = stmt
            .query_map(params![since], |row| row.get(0))?
            .collect::<Result<HashSet<i64>, _>>()?;
        Ok(ids)
    }

    /// Newest first.
    pub fn get_suggestion_history(&self, limit: i64) -> Result<Vec<SuggestionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, suggested_at FROM suggestion_history
             ORDER BY id DESC LIMIT ?1",
        )?;
        let records = stmt
            .query_map(params![limit], Self::suggestion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    // --- Shopping list ---

    /// Inserts an entry unless the product already has one. Returns whether a
    /// row was created. Uniqueness is enforced by the table's constraint.
    pub fn insert_shopping_entry_if_absent(&self, product_id: i64, added_at: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "INSERT INTO shopping_list (product_id, added_at) VALUES (?1, ?2)
             ON CONFLICT(product_id) DO NOTHING",
            params![product_id, added_at],
        )?;
        Ok(rows > 0)
    }

    pub fn get_shopping_entry(&self, product_id: i64) -> Result<Option<ShoppingListEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!(
                    "SELECT sl.id, sl.product_id, sl.added_at, {PRODUCT_COLUMNS}
                     FROM shopping_list sl
                     JOIN products p ON sl.product_id = p.id
                     WHERE sl.product_id = ?1"
                ),
                params![product_id],
                Self::shopping_entry_from_row,
            )
            .optional()?;
        match entry {
            Some(mut entry) => {
                entry.product.stores = self.stores_for_product(product_id)?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    fn shopping_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<ShoppingListEntry> {
        Ok(ShoppingListEntry {
            id: row.get(0)?,
            product_id: row.get(1)?,
            added_at: row.get(2)?,
            product: Self::product_from_row(row, 3)?,
        })
    }

    pub fn delete_shopping_entry(&self, product_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM shopping_list WHERE product_id = ?1",
            params![product_id],
        )?;
        Ok(rows > 0)
    }

    /// Newest first.
    pub fn list_shopping_entries(&self) -> Result<Vec<ShoppingListEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT sl.id, sl.product_id, sl.added_at, {PRODUCT_COLUMNS}
             FROM shopping_list sl
             JOIN products p ON sl.product_id = p.id
             ORDER BY sl.added_at DESC, sl.id DESC"
        ))?;
        let mut entries = stmt
            .query_map([], Self::shopping_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for entry in &mut entries {
            entry.product.stores = self.stores_for_product(entry.product_id)?;
        }
        Ok(entries)
    }

    // --- Recent items ---

    /// Creates the recent item or bumps its `last_used`. The stored time only
    /// moves forward.
    pub fn touch_recent_item(&self, product_id: i64, at: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO recent_items (product_id, last_used) VALUES (?1, ?2)
             ON CONFLICT(product_id) DO UPDATE SET last_used = MAX(last_used, excluded.last_used)",
            params![product_id, at],
        )?;
        Ok(())
    }

    /// Most recently used first. `None` returns every recent item.
    pub fn list_recent_items(&self, limit: Option<usize>) -> Result<Vec<RecentItem>> {
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT ri.product_id, ri.last_used, {PRODUCT_COLUMNS}
             FROM recent_items ri
             JOIN products p ON ri.product_id = p.id
             ORDER BY ri.last_used DESC, ri.product_id DESC
             LIMIT ?1"
        ))?;
        let mut items = stmt
            .query_map(params![limit], |row| {
                Ok(RecentItem {
                    product_id: row.get(0)?,
                    last_used: row.get(1)?,
                    product: Self::product_from_row(row, 2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for item in &mut items {
            item.product.stores = self.stores_for_product(item.product_id)?;
        }
        Ok(items)
    }
}

/// Case-insensitive substring pattern with LIKE wildcards escaped.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
