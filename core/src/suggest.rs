use chrono::{DateTime, TimeZone};
use rand::Rng;

use crate::db::Database;
use crate::error::{CoreError, Result};
use crate::history::HistoryLedger;
use crate::models::{Recipe, Suggestion};
use crate::period::MealPeriod;

/// Days a suggested recipe is held back before it can be proposed again.
pub const DEFAULT_EXCLUSION_DAYS: u32 = 7;

/// Picks a recipe for the current meal period, avoiding recent repeats.
pub struct SuggestionSelector<'a> {
    db: &'a Database,
    exclusion_days: u32,
}

impl<'a> SuggestionSelector<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            exclusion_days: DEFAULT_EXCLUSION_DAYS,
        }
    }

    #[must_use]
    pub fn with_exclusion_days(mut self, days: u32) -> Self {
        self.exclusion_days = days;
        self
    }

    /// Propose one recipe for the period `now` falls in and record it.
    ///
    /// Recipes suggested inside the exclusion window are skipped. When that
    /// leaves nothing, the pick is drawn from every recipe of the period and
    /// the result is flagged `repeated`. Fails with `NoRecipesForPeriod` only
    /// when the period has no recipes at all; nothing is recorded then.
    ///
    /// The whole read-pick-record sequence runs in one transaction.
    pub fn suggest<Tz: TimeZone, R: Rng>(
        &self,
        now: &DateTime<Tz>,
        rng: &mut R,
    ) -> Result<Suggestion> {
        let period = MealPeriod::at(now);
        self.db.atomically(|db| {
            let ledger = HistoryLedger::new(db);
            let excluded = ledger.recently_suggested_ids(self.exclusion_days, now)?;
            let all_for_period = db.recipes_for_period(period)?;

            let candidates: Vec<&Recipe> = all_for_period
                .iter()
                .filter(|r| !excluded.contains(&r.id))
                .collect();

            let (pick, repeated) = if candidates.is_empty() {
                let fallback: Vec<&Recipe> = all_for_period.iter().collect();
                let pick =
                    pick_one(&fallback, rng).ok_or(CoreError::NoRecipesForPeriod(period))?;
                tracing::debug!(
                    %period,
                    excluded = excluded.len(),
                    "every candidate suggested recently, falling back to full list"
                );
                (pick, true)
            } else {
                let pick = pick_one(&candidates, rng).ok_or(CoreError::NoRecipesForPeriod(period))?;
                (pick, false)
            };

            ledger.record_suggestion(pick.id, now)?;
            let recipe = db.get_recipe_detail(pick.id)?;
            tracing::debug!(%period, recipe_id = pick.id, repeated, "suggested {}", pick.name);

            Ok(Suggestion {
                meal_period: period,
                repeated,
                recipe,
            })
        })
    }
}

/// Uniform pick from a candidate list fixed before the draw.
fn pick_one<'r, R: Rng>(candidates: &[&'r Recipe], rng: &mut R) -> Option<&'r Recipe> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.random_range(0..candidates.len())])
}
