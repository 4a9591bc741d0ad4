use thiserror::Error;

use crate::period::MealPeriod;

/// Errors surfaced by the core library.
///
/// Storage failures are carried through untouched; the only business-level
/// recovery the core performs is the suggestion fallback, which never
/// produces an error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No recipes found for {0}")]
    NoRecipesForPeriod(MealPeriod),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("{0}")]
    Invalid(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),
}

impl CoreError {
    pub(crate) fn not_found(kind: &'static str, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
