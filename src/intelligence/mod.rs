/// Intelligence module
///
/// Contextual app prediction: scoring, ranking and probability estimates
/// over logged usage history.

pub mod analyzer;
pub mod config;
pub mod context;
pub mod geo;
pub mod predictor;
pub mod probability;
pub mod scorer;

pub use analyzer::{AnalysisReport, Analyzer, WatchedApp, DEFAULT_WATCHED_APP};
pub use config::{LocationSignal, PredictorConfig, ScoringWeights, DEFAULT_NOTIFY_THRESHOLD};
pub use context::{Activity, ContextSnapshot};
pub use geo::GeoPoint;
pub use predictor::{AppScore, Predictor};
pub use probability::{ProbabilityTarget, WindowCounts};
pub use scorer::Scorer;
