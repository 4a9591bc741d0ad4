pub mod clock;
pub mod db;
pub mod error;
pub mod history;
pub mod models;
pub mod period;
pub mod reconcile;
pub mod seed;
pub mod service;
pub mod shopping;
pub mod suggest;

pub use error::{CoreError, Result};
pub use period::MealPeriod;
pub use service::PlannerService;
