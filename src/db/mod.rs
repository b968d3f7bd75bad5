/// Database module for nextapp
///
/// Append-only event store on SQLite via sqlx, with connection pooling.

pub mod connection;
pub mod models;
pub mod queries;

pub use connection::{Database, DatabaseStats};
pub use models::*;
pub use queries::CONFIG_KEY;
