use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone};

use crate::clock::timestamp;
use crate::db::Database;
use crate::error::{CoreError, Result};
use crate::models::SuggestionRecord;

/// Append-only log of which recipe was proposed when.
///
/// Records are never edited. They leave the log only when their recipe is
/// deleted.
pub struct HistoryLedger<'a> {
    db: &'a Database,
}

impl<'a> HistoryLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a record for `recipe_id` at `now`.
    ///
    /// If `now` is earlier than the newest record (clock moved backwards) the
    /// record takes the newest record's time, so timestamps stay ordered.
    pub fn record_suggestion<Tz: TimeZone>(
        &self,
        recipe_id: i64,
        now: &DateTime<Tz>,
    ) -> Result<SuggestionRecord> {
        self.db.get_recipe(recipe_id)?;
        let record = self.db.insert_suggestion(recipe_id, &timestamp(now))?;
        tracing::debug!(recipe_id, at = %record.suggested_at, "recorded suggestion");
        Ok(record)
    }

    /// Recipe ids suggested within the trailing `window_days` before `now`.
    ///
    /// The window is `[now - window_days, now]`, so a zero-day window still
    /// holds records stamped at `now`. No matching records is an empty set,
    /// not an error.
    pub fn recently_suggested_ids<Tz: TimeZone>(
        &self,
        window_days: u32,
        now: &DateTime<Tz>,
    ) -> Result<HashSet<i64>> {
        let since = now.clone() - Duration::days(i64::from(window_days));
        self.db.suggested_recipe_ids_since(&timestamp(&since))
    }

    /// The newest `limit` records, newest first.
    pub fn recent_records(&self, limit: usize) -> Result<Vec<SuggestionRecord>> {
        let limit = i64::try_from(limit).map_err(|_| CoreError::invalid("limit is too large"))?;
        self.db.get_suggestion_history(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRecipe;
    use crate::period::MealPeriod;
    use chrono::Utc;

    fn recipe(db: &Database, name: &str) -> i64 {
        db.insert_recipe(&NewRecipe {
            name: name.to_string(),
            photo: None,
            prep_time: 0,
            cook_time: 0,
            meal_type: MealPeriod::Lunch,
            notes: None,
            ingredients: vec![],
        })
        .unwrap()
        .recipe
        .id
    }

    #[test]
    fn test_window_boundaries() {
        let db = Database::open_in_memory().unwrap();
        let ledger = HistoryLedger::new(&db);
        let a = recipe(&db, "A");
        let b = recipe(&db, "B");
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        let eight_days_ago = now - Duration::days(8);
        let two_days_ago = now - Duration::days(2);
        ledger.record_suggestion(a, &eight_days_ago).unwrap();
        ledger.record_suggestion(b, &two_days_ago).unwrap();

        let recent = ledger.recently_suggested_ids(7, &now).unwrap();
        assert_eq!(recent, HashSet::from([b]));

        let wide = ledger.recently_suggested_ids(30, &now).unwrap();
        assert_eq!(wide, HashSet::from([a, b]));
    }

    #[test]
    fn test_exactly_window_days_ago_is_included() {
        let db = Database::open_in_memory().unwrap();
        let ledger = HistoryLedger::new(&db);
        let a = recipe(&db, "A");
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        let week_ago = now - Duration::days(7);
        ledger.record_suggestion(a, &week_ago).unwrap();
        assert!(ledger.recently_suggested_ids(7, &now).unwrap().contains(&a));
    }

    #[test]
    fn test_empty_history_and_zero_window() {
        let db = Database::open_in_memory().unwrap();
        let ledger = HistoryLedger::new(&db);
        let a = recipe(&db, "A");
        let b = recipe(&db, "B");
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        assert!(ledger.recently_suggested_ids(7, &now).unwrap().is_empty());
        assert!(ledger.recently_suggested_ids(0, &now).unwrap().is_empty());

        let hour_ago = now - Duration::hours(1);
        ledger.record_suggestion(b, &hour_ago).unwrap();
        ledger.record_suggestion(a, &now).unwrap();
        let zero = ledger.recently_suggested_ids(0, &now).unwrap();
        assert_eq!(zero, HashSet::from([a]));
    }

    #[test]
    fn test_record_unknown_recipe() {
        let db = Database::open_in_memory().unwrap();
        let ledger = HistoryLedger::new(&db);
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let err = ledger.record_suggestion(9, &now).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_records_are_ordered_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let ledger = HistoryLedger::new(&db);
        let a = recipe(&db, "A");
        let b = recipe(&db, "B");
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        ledger.record_suggestion(a, &now).unwrap();
        // Clock moved backwards; the stored time is clamped
        let hour_ago = now - Duration::hours(1);
        ledger.record_suggestion(b, &hour_ago).unwrap();

        let records = ledger.recent_records(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].recipe_id, b);
        assert!(records[0].suggested_at >= records[1].suggested_at);
        // The clamped record still counts as recent
        assert!(ledger.recently_suggested_ids(1, &now).unwrap().contains(&b));
    }
}
