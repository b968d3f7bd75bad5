/// Main analyzer orchestrator
///
/// The background path: rank apps for the current context and decide which
/// watched apps are likely enough to surface proactively. One history fetch
/// serves every computation, so a failed fetch yields no report at all.

use crate::db::Database;
use crate::error::Result;
use crate::intelligence::predictor::{self, AppScore, Predictor};
use crate::intelligence::probability::{self, ProbabilityTarget, WindowCounts};
use crate::intelligence::{ContextSnapshot, PredictorConfig};
use chrono::Utc;
use std::sync::Arc;

/// App watched for proactive surfacing unless the caller names others
pub const DEFAULT_WATCHED_APP: &str = "com.google.android.apps.maps";

/// Probability verdict for one watched app
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedApp {
    pub package: String,
    pub probability: f64,
    pub counts: WindowCounts,
    pub surface: bool,
}

/// Analysis report
#[derive(Debug)]
pub struct AnalysisReport {
    pub hour: u32,
    pub history_size: usize,
    pub ranking: Vec<AppScore>,
    pub prediction: Option<AppScore>,
    pub watched: Vec<WatchedApp>,
}

impl AnalysisReport {
    /// Watched apps that crossed the threshold
    pub fn to_surface(&self) -> impl Iterator<Item = &WatchedApp> {
        self.watched.iter().filter(|w| w.surface)
    }
}

/// Main analyzer
pub struct Analyzer {
    predictor: Predictor,
}

impl Analyzer {
    /// Create a new analyzer
    pub fn new(db: Arc<Database>, config: PredictorConfig) -> Self {
        Self {
            predictor: Predictor::new(db, config),
        }
    }

    /// Run full analysis
    ///
    /// Ranks apps for `context` and checks every watched app against
    /// `threshold`.
    pub async fn analyze(
        &self,
        context: &ContextSnapshot,
        watched: &[String],
        threshold: f64,
    ) -> Result<AnalysisReport> {
        let config = self.predictor.config();
        let now_ms = Utc::now().timestamp_millis();
        let history = self.predictor.history(now_ms).await?;

        let ranking = predictor::rank_apps(&history, context, now_ms, config);
        let prediction = ranking.first().cloned();

        let watched = watched
            .iter()
            .map(|package| {
                let target = ProbabilityTarget::App(package.as_str());
                let counts =
                    probability::count_in_window(&history, &target, context.hour, now_ms, config);
                let p = probability::probability_at_hour(
                    &history,
                    &target,
                    context.hour,
                    now_ms,
                    config,
                );

                WatchedApp {
                    package: package.clone(),
                    probability: p,
                    counts,
                    surface: probability::should_surface(p, threshold),
                }
            })
            .collect();

        log::info!(
            "Analyzed {} events at hour {}: {} candidate apps",
            history.len(),
            context.hour,
            ranking.len()
        );

        Ok(AnalysisReport {
            hour: context.hour,
            history_size: history.len(),
            ranking,
            prediction,
            watched,
        })
    }
}
