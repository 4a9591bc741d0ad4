//! Sorting products into shopping-list display buckets.
//!
//! A matching product lands in exactly one bucket. List membership wins over
//! recency, and recency wins over "new".

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Product, RecentItem, ShoppingListEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    InList,
    Recent,
    New,
}

/// What the UI may offer for a product in a given bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    Remove,
}

impl Bucket {
    #[must_use]
    pub fn action(self) -> Action {
        match self {
            Self::InList => Action::Remove,
            Self::Recent | Self::New => Action::Add,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchBuckets {
    pub in_list: Vec<Product>,
    pub recent: Vec<Product>,
    pub new: Vec<Product>,
}

impl SearchBuckets {
    pub fn is_empty(&self) -> bool {
        self.in_list.is_empty() && self.recent.is_empty() && self.new.is_empty()
    }

    pub fn len(&self) -> usize {
        self.in_list.len() + self.recent.len() + self.new.len()
    }
}

/// Shopping list plus the recent items that are not on it.
#[derive(Debug, Clone, Serialize)]
pub struct BrowseView {
    pub shopping_list: Vec<ShoppingListEntry>,
    pub recent: Vec<RecentItem>,
}

/// Case-insensitive substring match on the product name. A blank term
/// matches nothing.
#[must_use]
pub fn matches(name: &str, term: &str) -> bool {
    let term = term.trim();
    !term.is_empty() && name.to_lowercase().contains(&term.to_lowercase())
}

#[must_use]
pub fn classify(product_id: i64, on_list: &HashSet<i64>, recent: &HashSet<i64>) -> Bucket {
    if on_list.contains(&product_id) {
        Bucket::InList
    } else if recent.contains(&product_id) {
        Bucket::Recent
    } else {
        Bucket::New
    }
}

/// Partition every product matching `term` into disjoint buckets.
///
/// `in_list` keeps shopping-list order, `recent` keeps recency order and
/// `new` keeps catalog order.
#[must_use]
pub fn reconcile(
    term: &str,
    catalog: &[Product],
    list: &[ShoppingListEntry],
    recent: &[RecentItem],
) -> SearchBuckets {
    let on_list: HashSet<i64> = list.iter().map(|e| e.product_id).collect();
    let recent_ids: HashSet<i64> = recent.iter().map(|r| r.product_id).collect();
    let mut buckets = SearchBuckets::default();
    let mut placed = HashSet::new();

    let sources = list
        .iter()
        .map(|e| &e.product)
        .chain(recent.iter().map(|r| &r.product))
        .chain(catalog.iter());

    for product in sources {
        if !matches(&product.name, term) || !placed.insert(product.id) {
            continue;
        }
        let bucket = match classify(product.id, &on_list, &recent_ids) {
            Bucket::InList => &mut buckets.in_list,
            Bucket::Recent => &mut buckets.recent,
            Bucket::New => &mut buckets.new,
        };
        bucket.push(product.clone());
    }

    buckets
}

/// Build the default view: the full list, then up to `limit` recent items
/// that are not already on it.
#[must_use]
pub fn browse(list: Vec<ShoppingListEntry>, recent: Vec<RecentItem>, limit: usize) -> BrowseView {
    let on_list: HashSet<i64> = list.iter().map(|e| e.product_id).collect();
    let recent = recent
        .into_iter()
        .filter(|r| !on_list.contains(&r.product_id))
        .take(limit)
        .collect();
    BrowseView {
        shopping_list: list,
        recent,
    }
}
