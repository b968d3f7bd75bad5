/// Scoring primitives for the prediction engine
///
/// Turns one historical event plus the live context into a weighted,
/// recency-decayed contribution.

use crate::db::ContextEvent;
use crate::intelligence::{ContextSnapshot, LocationSignal, PredictorConfig, ScoringWeights};

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Scorer for event contributions
pub struct Scorer;

impl Scorer {
    /// Shortest distance between two hours on a 24-hour clock face.
    ///
    /// 23 and 1 are 2 hours apart. Result is always in 0..=12.
    pub fn circular_hour_distance(a: i64, b: i64) -> u32 {
        let diff = (a.rem_euclid(24) - b.rem_euclid(24)).abs();
        diff.min(24 - diff) as u32
    }

    /// Base score for how close in time an event is, `None` past two hours
    pub fn time_proximity_score(distance: u32, weights: &ScoringWeights) -> Option<f64> {
        match distance {
            0 => Some(weights.same_hour),
            1 => Some(weights.one_hour),
            2 => Some(weights.two_hours),
            _ => None,
        }
    }

    /// Whole days between `now_ms` and `timestamp_ms`. Future events are 0 days old.
    pub fn days_old(now_ms: i64, timestamp_ms: i64) -> i64 {
        ((now_ms - timestamp_ms) / MILLIS_PER_DAY).max(0)
    }

    /// Recency decay `1 / (1 + days_old)`
    pub fn recency_decay(days_old: i64) -> f64 {
        1.0 / (1.0 + days_old.max(0) as f64)
    }

    /// Geo bonus applies strictly inside the radius, never for unknown distances
    pub fn within_geo_radius(distance_meters: Option<f64>, radius_meters: f64) -> bool {
        matches!(distance_meters, Some(d) if d < radius_meters)
    }

    /// Earliest timestamp still inside a window of `days` days ending at `now_ms`.
    /// Saturates instead of overflowing for absurd windows.
    pub fn window_start(now_ms: i64, days: i64) -> i64 {
        now_ms.saturating_sub(days.saturating_mul(MILLIS_PER_DAY))
    }

    /// Is the event older than the configured history window?
    pub fn outside_window(event: &ContextEvent, now_ms: i64, config: &PredictorConfig) -> bool {
        event.timestamp <= Self::window_start(now_ms, config.history_window_days)
    }

    /// Final contribution of one event to its app's total.
    ///
    /// `day_of_week` is the resolved weekday of the context (Sunday = 1).
    /// Returns `None` when the event is too far away in time to count at all.
    pub fn score_event(
        event: &ContextEvent,
        context: &ContextSnapshot,
        day_of_week: u32,
        now_ms: i64,
        config: &PredictorConfig,
    ) -> Option<f64> {
        let weights = &config.weights;

        let distance = Self::circular_hour_distance(event.hour_of_day, context.hour as i64);
        let mut score = weights.base + Self::time_proximity_score(distance, weights)?;

        if context.activity.is_known() && event.activity() == context.activity {
            score += weights.activity_match;
        }

        if context.headphones && event.is_headphones_connected {
            score += weights.headphones_match;
        }

        if event.day_of_week == day_of_week as i64 {
            score += weights.day_of_week_match;
        }

        match config.location_signal {
            LocationSignal::Gps => {
                let distance = context.location.distance_meters(&event.location());
                if Self::within_geo_radius(distance, config.geo_radius_meters) {
                    score += weights.geo_proximity;
                }
            }
            LocationSignal::Wifi => {
                if let (Some(current), Some(logged)) = (context.wifi_ssid.as_deref(), event.wifi()) {
                    if current == logged {
                        score += weights.wifi_match;
                    }
                }
            }
        }

        let decay = Self::recency_decay(Self::days_old(now_ms, event.timestamp));

        Some(score * decay)
    }
}
