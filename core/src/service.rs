use std::path::Path;

use chrono::{DateTime, Local};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::{Clock, SystemClock};
use crate::db::Database;
use crate::error::Result;
use crate::history::HistoryLedger;
use crate::models::{ProductFilter, RecentItem, ShoppingListEntry, Suggestion, SuggestionRecord};
use crate::period::MealPeriod;
use crate::reconcile::{self, BrowseView, SearchBuckets};
use crate::seed::{self, SeedSummary};
use crate::shopping::{AddedEntry, RECENT_ITEMS_PAGE, ShoppingListLedger};
use crate::suggest::{DEFAULT_EXCLUSION_DAYS, SuggestionSelector};

/// The planner's entry point: one database handle plus the clock and random
/// source the decision components draw from.
///
/// Plain CRUD goes straight through [`PlannerService::db`].
pub struct PlannerService {
    db: Database,
    clock: Box<dyn Clock>,
    rng: StdRng,
    exclusion_days: u32,
}

impl PlannerService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self::from_database(db))
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::from_database(db))
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            db,
            clock: Box::new(SystemClock),
            rng: StdRng::from_os_rng(),
            exclusion_days: DEFAULT_EXCLUSION_DAYS,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn with_exclusion_days(mut self, days: u32) -> Self {
        self.exclusion_days = days;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    pub fn current_period(&self) -> MealPeriod {
        MealPeriod::at(&self.now())
    }

    // --- Suggestions ---

    pub fn suggest(&mut self) -> Result<Suggestion> {
        let now = self.clock.now();
        SuggestionSelector::new(&self.db)
            .with_exclusion_days(self.exclusion_days)
            .suggest(&now, &mut self.rng)
    }

    pub fn suggestion_history(&self, limit: usize) -> Result<Vec<SuggestionRecord>> {
        HistoryLedger::new(&self.db).recent_records(limit)
    }

    // --- Shopping list ---

    pub fn add_to_list(&self, product_id: i64) -> Result<AddedEntry> {
        ShoppingListLedger::new(&self.db).add(product_id, &self.now())
    }

    pub fn remove_from_list(&self, product_id: i64) -> Result<bool> {
        ShoppingListLedger::new(&self.db).remove(product_id)
    }

    pub fn shopping_list(&self) -> Result<Vec<ShoppingListEntry>> {
        ShoppingListLedger::new(&self.db).entries()
    }

    pub fn recent_items(&self, limit: usize) -> Result<Vec<RecentItem>> {
        ShoppingListLedger::new(&self.db).recent(Some(limit))
    }

    /// Bucket every product whose name contains `term`.
    pub fn search(&self, term: &str) -> Result<SearchBuckets> {
        if term.trim().is_empty() {
            return Ok(SearchBuckets::default());
        }
        let ledger = ShoppingListLedger::new(&self.db);
        let catalog = self.db.list_products(&ProductFilter::default())?;
        let list = ledger.entries()?;
        let recent = ledger.recent(None)?;
        Ok(reconcile::reconcile(term, &catalog, &list, &recent))
    }

    pub fn browse(&self) -> Result<BrowseView> {
        let ledger = ShoppingListLedger::new(&self.db);
        let list = ledger.entries()?;
        let recent = ledger.recent(None)?;
        Ok(reconcile::browse(list, recent, RECENT_ITEMS_PAGE))
    }

    // --- Setup ---

    pub fn seed(&self) -> Result<Option<SeedSummary>> {
        seed::seed_sample_data(&self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::CoreError;
    use chrono::TimeZone;

    fn service_at(hour: u32) -> PlannerService {
        let at = Local.with_ymd_and_hms(2024, 6, 15, hour, 0, 0).unwrap();
        PlannerService::new_in_memory()
            .unwrap()
            .with_clock(FixedClock(at))
            .with_seed(11)
    }

    fn product_id(svc: &PlannerService, name: &str) -> i64 {
        svc.db().find_products_by_name(name).unwrap()[0].id
    }

    #[test]
    fn test_suggest_follows_the_clock() {
        let mut svc = service_at(8);
        svc.seed().unwrap();
        assert_eq!(svc.current_period(), MealPeriod::Breakfast);
        let s = svc.suggest().unwrap();
        assert_eq!(s.meal_period, MealPeriod::Breakfast);
        assert_eq!(s.recipe.recipe.meal_type, MealPeriod::Breakfast);

        let s2 = svc.suggest().unwrap();
        assert_ne!(s2.recipe.recipe.id, s.recipe.recipe.id);
        assert!(svc.suggest().unwrap().repeated);
        assert_eq!(svc.suggestion_history(10).unwrap().len(), 3);
    }

    #[test]
    fn test_suggest_empty_catalog() {
        let mut svc = service_at(20);
        let err = svc.suggest().unwrap_err();
        assert!(matches!(err, CoreError::NoRecipesForPeriod(MealPeriod::Dinner)));
    }

    #[test]
    fn test_add_remove_and_search_buckets() {
        let svc = service_at(12);
        svc.seed().unwrap();
        let eggs = product_id(&svc, "Eggs");
        let cheese = product_id(&svc, "Cheese");

        svc.add_to_list(eggs).unwrap();
        svc.add_to_list(cheese).unwrap();
        svc.remove_from_list(cheese).unwrap();

        let buckets = svc.search("e").unwrap();
        let names = |ps: &[crate::models::Product]| -> Vec<String> {
            ps.iter().map(|p| p.name.clone()).collect()
        };
        assert_eq!(names(&buckets.in_list), vec!["Eggs"]);
        assert_eq!(names(&buckets.recent), vec!["Cheese"]);
        assert!(!names(&buckets.new).contains(&"Eggs".to_string()));
        assert!(names(&buckets.new).contains(&"Bread".to_string()));

        assert!(svc.search("  ").unwrap().is_empty());
    }

    #[test]
    fn test_browse_view() {
        let svc = service_at(12);
        svc.seed().unwrap();
        let milk = product_id(&svc, "Milk");
        let rice = product_id(&svc, "Rice");
        svc.add_to_list(milk).unwrap();
        svc.add_to_list(rice).unwrap();
        svc.remove_from_list(rice).unwrap();

        let view = svc.browse().unwrap();
        assert_eq!(view.shopping_list.len(), 1);
        assert_eq!(view.shopping_list[0].product_id, milk);
        assert_eq!(view.recent.len(), 1);
        assert_eq!(view.recent[0].product_id, rice);
        assert_eq!(svc.recent_items(RECENT_ITEMS_PAGE).unwrap().len(), 2);
    }

    #[test]
    fn test_service_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("larder.db");
        {
            let svc = PlannerService::new(&path).unwrap();
            svc.seed().unwrap();
        }
        let svc = PlannerService::new(&path).unwrap();
        assert!(svc.seed().unwrap().is_none());
        assert_eq!(svc.db().list_stores().unwrap().len(), 3);
    }
}
