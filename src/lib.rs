/// nextapp library
///
/// Predicts which app the user wants next from logged usage context.

pub mod core;
pub mod db;
pub mod error;
pub mod intelligence;

// Re-exports for convenience
pub use db::Database;
pub use error::{PredictorError, Result};
