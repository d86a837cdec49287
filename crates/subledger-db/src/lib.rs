mod error;
mod models;
mod reports;
mod repository;
mod schema;

pub use error::DbError;
pub use models::*;
pub use repository::{SubscriptionDb, today};
