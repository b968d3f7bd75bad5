/// Probability estimator
///
/// Empirical frequency of a target app (or activity) around a given hour.
/// Feeds "should we surface this now?" decisions; the threshold itself is
/// caller policy.

use crate::db::ContextEvent;
use crate::intelligence::{Activity, PredictorConfig, Scorer};

/// What to estimate the probability of
#[derive(Debug, Clone, PartialEq)]
pub enum ProbabilityTarget<'a> {
    App(&'a str),
    Activity(Activity),
}

impl ProbabilityTarget<'_> {
    fn matches(&self, event: &ContextEvent) -> bool {
        match self {
            ProbabilityTarget::App(package) => event.app_package_name == *package,
            ProbabilityTarget::Activity(activity) => event.activity() == *activity,
        }
    }
}

impl std::fmt::Display for ProbabilityTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbabilityTarget::App(package) => write!(f, "app {}", package),
            ProbabilityTarget::Activity(activity) => write!(f, "activity {}", activity),
        }
    }
}

/// Raw counts behind a probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowCounts {
    /// Events within the window around the query hour
    pub total: usize,
    /// Of those, how many matched the target
    pub matches: usize,
}

/// Count in-window observations and target matches around `hour`
pub fn count_in_window(
    history: &[ContextEvent],
    target: &ProbabilityTarget<'_>,
    hour: u32,
    now_ms: i64,
    config: &PredictorConfig,
) -> WindowCounts {
    let mut counts = WindowCounts::default();

    for event in history {
        if Scorer::outside_window(event, now_ms, config) {
            continue;
        }

        let distance = Scorer::circular_hour_distance(event.hour_of_day, hour as i64);
        if distance <= config.probability_window_hours {
            counts.total += 1;
            if target.matches(event) {
                counts.matches += 1;
            }
        }
    }

    counts
}

/// `matches / total` within the window, or 0.0 below the minimum sample size.
///
/// A minimum of zero is treated as one, so an empty window is always 0.0.
pub fn probability_at_hour(
    history: &[ContextEvent],
    target: &ProbabilityTarget<'_>,
    hour: u32,
    now_ms: i64,
    config: &PredictorConfig,
) -> f64 {
    if history.is_empty() {
        return 0.0;
    }

    let counts = count_in_window(history, target, hour, now_ms, config);

    // One matching event would otherwise read as 100%
    if counts.total < config.min_sample_size.max(1) {
        return 0.0;
    }

    counts.matches as f64 / counts.total as f64
}

/// Should a caller proactively surface the target at this probability?
pub fn should_surface(probability: f64, threshold: f64) -> bool {
    probability > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ContextEventInput, NO_WIFI};
    use crate::intelligence::scorer::MILLIS_PER_DAY;
    use crate::intelligence::DEFAULT_NOTIFY_THRESHOLD;

    const NOW: i64 = 1_750_000_000_000;
    const MAPS: &str = "com.google.android.apps.maps";

    fn event(app: &str, hour: i64, activity: Activity) -> ContextEvent {
        ContextEventInput {
            timestamp: NOW - MILLIS_PER_DAY / 2,
            hour_of_day: hour,
            minute: 30,
            day_of_week: 6,
            activity_type: activity.to_string(),
            is_headphones_connected: false,
            wifi_ssid: NO_WIFI.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            app_package_name: app.to_string(),
        }
        .into_event(0)
    }

    fn five_maps_at_14() -> Vec<ContextEvent> {
        (0..5).map(|_| event(MAPS, 14, Activity::Unknown)).collect()
    }

    #[test]
    fn test_empty_history_is_zero() {
        let config = PredictorConfig::default();
        let p = probability_at_hour(&[], &ProbabilityTarget::App(MAPS), 8, NOW, &config);
        assert_eq!(p, 0.0);
    }

    #[test]
    fn test_all_matching_in_window() {
        let config = PredictorConfig::default();
        let p = probability_at_hour(
            &five_maps_at_14(),
            &ProbabilityTarget::App(MAPS),
            14,
            NOW,
            &config,
        );
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_out_of_window_hour_is_zero() {
        let config = PredictorConfig::default();
        let p = probability_at_hour(
            &five_maps_at_14(),
            &ProbabilityTarget::App(MAPS),
            20,
            NOW,
            &config,
        );
        assert_eq!(p, 0.0);
    }

    #[test]
    fn test_minimum_sample_guard() {
        let config = PredictorConfig::default();
        let history: Vec<ContextEvent> = (0..4).map(|_| event(MAPS, 7, Activity::Unknown)).collect();

        // 4/4 would be 100%, but four samples aren't enough
        let p = probability_at_hour(&history, &ProbabilityTarget::App(MAPS), 7, NOW, &config);
        assert_eq!(p, 0.0);
    }

    #[test]
    fn test_zero_minimum_still_needs_one_sample() {
        let config = PredictorConfig {
            min_sample_size: 0,
            ..PredictorConfig::default()
        };

        let p = probability_at_hour(
            &five_maps_at_14(),
            &ProbabilityTarget::App(MAPS),
            20,
            NOW,
            &config,
        );
        assert_eq!(p, 0.0);

        let one = vec![event(MAPS, 20, Activity::Unknown)];
        let p = probability_at_hour(&one, &ProbabilityTarget::App(MAPS), 20, NOW, &config);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_window_wraps_midnight() {
        let config = PredictorConfig::default();
        let history = vec![
            event(MAPS, 23, Activity::Unknown),
            event(MAPS, 0, Activity::Unknown),
            event("com.netflix", 1, Activity::Unknown),
            event("com.netflix", 23, Activity::Unknown),
            event("com.netflix", 0, Activity::Unknown),
            event(MAPS, 2, Activity::Unknown), // 2 hours from 0, outside
        ];

        let counts = count_in_window(&history, &ProbabilityTarget::App(MAPS), 0, NOW, &config);
        assert_eq!(counts, WindowCounts { total: 5, matches: 2 });

        let p = probability_at_hour(&history, &ProbabilityTarget::App(MAPS), 0, NOW, &config);
        assert!((p - 0.4).abs() < 1e-12);
        assert!(!should_surface(p, DEFAULT_NOTIFY_THRESHOLD));
    }

    #[test]
    fn test_activity_variant() {
        let config = PredictorConfig::default();
        let mut history: Vec<ContextEvent> = (0..3)
            .map(|_| event("com.spotify.music", 8, Activity::Driving))
            .collect();
        history.push(event("com.slack", 9, Activity::Still));
        history.push(event("com.slack", 7, Activity::Walking));
        history.push(event("com.slack", 8, Activity::Still));

        let p = probability_at_hour(
            &history,
            &ProbabilityTarget::Activity(Activity::Driving),
            8,
            NOW,
            &config,
        );
        assert_eq!(p, 0.5);
        assert!(should_surface(p, DEFAULT_NOTIFY_THRESHOLD));
    }

    #[test]
    fn test_probability_is_bounded() {
        let config = PredictorConfig::default();
        let mut history = five_maps_at_14();
        history.extend((0..7).map(|_| event("com.slack", 13, Activity::Unknown)));

        for hour in 0..24 {
            let p = probability_at_hour(&history, &ProbabilityTarget::App(MAPS), hour, NOW, &config);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_should_surface_is_strict() {
        assert!(!should_surface(0.4, 0.4));
        assert!(should_surface(0.41, 0.4));
    }
}
