/// App prediction
///
/// Ranks apps by how well their past usage matches the current context and
/// picks the winner. The ranking functions are pure; `Predictor` only adds
/// the history fetch in front of them.

use crate::core::Retriever;
use crate::db::{ContextEvent, Database};
use crate::error::Result;
use crate::intelligence::probability::{self, ProbabilityTarget};
use crate::intelligence::{Activity, ContextSnapshot, PredictorConfig, Scorer};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

/// Cumulative score of one app for a context
#[derive(Debug, Clone, PartialEq)]
pub struct AppScore {
    pub package: String,
    pub score: f64,
    /// Number of events that contributed
    pub events: usize,
}

/// Rank every eligible app, best first.
///
/// Equal scores are ordered by package name so the result never depends on
/// the order history came back in.
pub fn rank_apps(
    history: &[ContextEvent],
    context: &ContextSnapshot,
    now_ms: i64,
    config: &PredictorConfig,
) -> Vec<AppScore> {
    let day_of_week = context.effective_day_of_week();
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();

    for event in history {
        let app = event.app_package_name.as_str();
        if !event.has_known_app() || config.is_excluded(app) {
            continue;
        }

        if Scorer::outside_window(event, now_ms, config) {
            continue;
        }

        let Some(contribution) = Scorer::score_event(event, context, day_of_week, now_ms, config)
        else {
            continue;
        };

        let entry = totals.entry(app).or_insert((0.0, 0));
        entry.0 += contribution;
        entry.1 += 1;
    }

    let mut ranking: Vec<AppScore> = totals
        .into_iter()
        .map(|(package, (score, events))| AppScore {
            package: package.to_string(),
            score,
            events,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.package.cmp(&b.package))
    });

    ranking
}

/// Most likely app for `context`, or `None` if nothing in history qualifies
pub fn predict_top_app(
    history: &[ContextEvent],
    context: &ContextSnapshot,
    now_ms: i64,
    config: &PredictorConfig,
) -> Option<AppScore> {
    if history.is_empty() {
        return None;
    }

    rank_apps(history, context, now_ms, config).into_iter().next()
}

/// Prediction engine backed by the event store
pub struct Predictor {
    retriever: Retriever,
    config: PredictorConfig,
}

impl Predictor {
    /// Create a new predictor
    pub fn new(db: Arc<Database>, config: PredictorConfig) -> Self {
        Self {
            retriever: Retriever::new(db),
            config,
        }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Fetch the history window the engine scores over
    pub async fn history(&self, now_ms: i64) -> Result<Vec<ContextEvent>> {
        self.retriever
            .events_within_days(self.config.history_window_days, now_ms)
            .await
    }

    /// Most likely app for the given context
    pub async fn predict_top_app(&self, context: &ContextSnapshot) -> Result<Option<AppScore>> {
        let now_ms = Utc::now().timestamp_millis();
        let history = self.history(now_ms).await?;

        let prediction = predict_top_app(&history, context, now_ms, &self.config);

        match &prediction {
            Some(top) => log::debug!(
                "Predicted {} (score {:.3}) from {} events at hour {}",
                top.package,
                top.score,
                history.len(),
                context.hour
            ),
            None => log::debug!(
                "No prediction from {} events at hour {}",
                history.len(),
                context.hour
            ),
        }

        Ok(prediction)
    }

    /// Full ranking for the given context
    pub async fn rank_apps(&self, context: &ContextSnapshot) -> Result<Vec<AppScore>> {
        let now_ms = Utc::now().timestamp_millis();
        let history = self.history(now_ms).await?;

        Ok(rank_apps(&history, context, now_ms, &self.config))
    }

    /// How often `package` was in use within the window around `hour`
    pub async fn app_probability_at_time(&self, package: &str, hour: u32) -> Result<f64> {
        self.probability_at_time(ProbabilityTarget::App(package), hour)
            .await
    }

    /// How often the user was doing `activity` within the window around `hour`
    pub async fn activity_probability_at_time(&self, activity: Activity, hour: u32) -> Result<f64> {
        self.probability_at_time(ProbabilityTarget::Activity(activity), hour)
            .await
    }

    async fn probability_at_time(&self, target: ProbabilityTarget<'_>, hour: u32) -> Result<f64> {
        let now_ms = Utc::now().timestamp_millis();
        let history = self.history(now_ms).await?;

        let p = probability::probability_at_hour(&history, &target, hour, now_ms, &self.config);
        log::debug!("P({}) at hour {} = {:.3}", target, hour, p);

        Ok(p)
    }
}
