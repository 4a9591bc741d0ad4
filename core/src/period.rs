use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Timelike};
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The meal a recipe is meant for, and the meal the clock says it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealPeriod {
    Breakfast,
    Lunch,
    Dinner,
}

pub const MEAL_PERIODS: &[MealPeriod] = &[
    MealPeriod::Breakfast,
    MealPeriod::Lunch,
    MealPeriod::Dinner,
];

/// First hour (inclusive) of breakfast.
pub const BREAKFAST_START: u32 = 6;
/// First hour of lunch; breakfast ends here.
pub const LUNCH_START: u32 = 11;
/// First hour of dinner; lunch ends here. Dinner wraps past midnight until breakfast.
pub const DINNER_START: u32 = 17;

impl MealPeriod {
    /// Classify a wall-clock hour.
    ///
    /// `[6, 11)` is breakfast, `[11, 17)` is lunch, everything else is dinner.
    /// Hours above 23 are treated like any other out-of-window hour.
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        if (BREAKFAST_START..LUNCH_START).contains(&hour) {
            Self::Breakfast
        } else if (LUNCH_START..DINNER_START).contains(&hour) {
            Self::Lunch
        } else {
            Self::Dinner
        }
    }

    #[must_use]
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::from_hour(now.hour())
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealPeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            _ => Err(CoreError::invalid(format!(
                "Invalid meal type '{s}'. Must be one of: breakfast, lunch, dinner"
            ))),
        }
    }
}

impl ToSql for MealPeriod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MealPeriod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, Utc};

    #[test]
    fn test_breakfast_window() {
        for h in 6..11 {
            assert_eq!(MealPeriod::from_hour(h), MealPeriod::Breakfast, "hour {h}");
        }
    }

    #[test]
    fn test_lunch_window() {
        for h in 11..17 {
            assert_eq!(MealPeriod::from_hour(h), MealPeriod::Lunch, "hour {h}");
        }
    }

    #[test]
    fn test_dinner_wraps_midnight() {
        for h in (17..24).chain(0..6) {
            assert_eq!(MealPeriod::from_hour(h), MealPeriod::Dinner, "hour {h}");
        }
    }

    #[test]
    fn test_period_at_datetime() {
        let noon = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(MealPeriod::at(&noon), MealPeriod::Lunch);
        let early = Local.with_ymd_and_hms(2024, 6, 15, 5, 59, 59).unwrap();
        assert_eq!(MealPeriod::at(&early), MealPeriod::Dinner);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("Lunch".parse::<MealPeriod>().unwrap(), MealPeriod::Lunch);
        assert_eq!(" DINNER ".parse::<MealPeriod>().unwrap(), MealPeriod::Dinner);
        assert!("snack".parse::<MealPeriod>().is_err());
        assert!("".parse::<MealPeriod>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&MealPeriod::Breakfast).unwrap();
        assert_eq!(json, "\"breakfast\"");
        let back: MealPeriod = serde_json::from_str("\"dinner\"").unwrap();
        assert_eq!(back, MealPeriod::Dinner);
    }
}
