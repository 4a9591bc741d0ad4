use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::clock::timestamp;
use crate::db::Database;
use crate::error::{CoreError, Result};
use crate::models::{RecentItem, ShoppingListEntry};

/// Recent items shown by default.
pub const RECENT_ITEMS_PAGE: usize = 10;

/// Result of adding a product to the list.
#[derive(Debug, Clone, Serialize)]
pub struct AddedEntry {
    #[serde(flatten)]
    pub entry: ShoppingListEntry,
    /// False when the product was already on the list.
    #[serde(skip)]
    pub created: bool,
}

pub struct ShoppingListLedger<'a> {
    db: &'a Database,
}

impl<'a> ShoppingListLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Put a product on the list. Adding a product that is already listed
    /// returns the existing entry untouched. A new entry also bumps the
    /// product's recent item, in the same transaction.
    pub fn add<Tz: TimeZone>(&self, product_id: i64, now: &DateTime<Tz>) -> Result<AddedEntry> {
        let at = timestamp(now);
        self.db.atomically(|db| {
            if !db.product_exists(product_id)? {
                return Err(CoreError::not_found("Product", product_id));
            }
            let created = db.insert_shopping_entry_if_absent(product_id, &at)?;
            if created {
                db.touch_recent_item(product_id, &at)?;
            }
            let entry = db
                .get_shopping_entry(product_id)?
                .ok_or_else(|| CoreError::not_found("Shopping list entry", product_id))?;
            tracing::debug!(product_id, created, "shopping list add");
            Ok(AddedEntry { entry, created })
        })
    }

    /// Take a product off the list. Returns false if it was not listed.
    /// The recent item is left alone.
    pub fn remove(&self, product_id: i64) -> Result<bool> {
        let removed = self.db.delete_shopping_entry(product_id)?;
        tracing::debug!(product_id, removed, "shopping list remove");
        Ok(removed)
    }

    pub fn entries(&self) -> Result<Vec<ShoppingListEntry>> {
        self.db.list_shopping_entries()
    }

    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<RecentItem>> {
        self.db.list_recent_items(limit)
    }
}
