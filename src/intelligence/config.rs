/// Tunable policy for the prediction engine
///
/// The numbers below are the shipped defaults. Every one of them can be
/// overridden through `PredictorConfig`, which is persisted as JSON in the
/// store's preferences table.

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};

/// Score added before any context bonus
pub const BASE_EVENT_SCORE: f64 = 0.0;
/// Event logged in the same hour
pub const SAME_HOUR_SCORE: f64 = 3.0;
/// Event logged one hour away
pub const ONE_HOUR_SCORE: f64 = 1.5;
/// Event logged two hours away
pub const TWO_HOUR_SCORE: f64 = 0.5;
pub const ACTIVITY_MATCH_BONUS: f64 = 3.0;
pub const HEADPHONES_MATCH_BONUS: f64 = 3.0;
pub const DAY_OF_WEEK_MATCH_BONUS: f64 = 1.0;
pub const GEO_PROXIMITY_BONUS: f64 = 5.0;
pub const WIFI_MATCH_BONUS: f64 = 2.0;

/// Events closer than this (strictly) count as "same place"
pub const GEO_RADIUS_METERS: f64 = 100.0;
/// How far back the engine looks
pub const HISTORY_WINDOW_DAYS: i64 = 30;
/// Longest window a config may ask for (about a century)
pub const MAX_HISTORY_WINDOW_DAYS: i64 = 36_500;
/// Half-width of the probability window, in circular hours
pub const PROBABILITY_WINDOW_HOURS: u32 = 1;
/// Below this many in-window samples a probability is reported as 0.0
pub const MIN_SAMPLE_SIZE: usize = 5;
/// Probability above which a caller should proactively surface an app
pub const DEFAULT_NOTIFY_THRESHOLD: f64 = 0.4;

/// Launcher, system UI and keyboard show up constantly in usage logs but
/// are never what the user meant to open.
pub const DEFAULT_EXCLUDED_PACKAGES: &[&str] = &[
    "com.sec.android.app.launcher",
    "com.android.systemui",
    "com.google.android.inputmethod.latin",
];

/// Per-signal score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub base: f64,
    pub same_hour: f64,
    pub one_hour: f64,
    pub two_hours: f64,
    pub activity_match: f64,
    pub headphones_match: f64,
    pub day_of_week_match: f64,
    pub geo_proximity: f64,
    pub wifi_match: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: BASE_EVENT_SCORE,
            same_hour: SAME_HOUR_SCORE,
            one_hour: ONE_HOUR_SCORE,
            two_hours: TWO_HOUR_SCORE,
            activity_match: ACTIVITY_MATCH_BONUS,
            headphones_match: HEADPHONES_MATCH_BONUS,
            day_of_week_match: DAY_OF_WEEK_MATCH_BONUS,
            geo_proximity: GEO_PROXIMITY_BONUS,
            wifi_match: WIFI_MATCH_BONUS,
        }
    }
}

/// Which location signal a deployment scores on. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSignal {
    Gps,
    Wifi,
}

impl std::fmt::Display for LocationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationSignal::Gps => write!(f, "gps"),
            LocationSignal::Wifi => write!(f, "wifi"),
        }
    }
}

/// Configuration for the prediction engine with tunable thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub weights: ScoringWeights,

    /// Strict upper bound for the geo bonus
    pub geo_radius_meters: f64,

    /// History older than this is ignored
    pub history_window_days: i64,

    /// Probability estimator counts events within this many circular hours
    pub probability_window_hours: u32,

    /// Probability estimator returns 0.0 below this many samples
    pub min_sample_size: usize,

    pub location_signal: LocationSignal,

    /// Packages that are never predicted
    pub excluded_packages: Vec<String>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            geo_radius_meters: GEO_RADIUS_METERS,
            history_window_days: HISTORY_WINDOW_DAYS,
            probability_window_hours: PROBABILITY_WINDOW_HOURS,
            min_sample_size: MIN_SAMPLE_SIZE,
            location_signal: LocationSignal::Gps,
            excluded_packages: DEFAULT_EXCLUDED_PACKAGES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl PredictorConfig {
    /// Legacy variant that scores Wi-Fi SSID instead of GPS proximity
    pub fn wifi_variant() -> Self {
        Self {
            location_signal: LocationSignal::Wifi,
            ..Self::default()
        }
    }

    pub fn is_excluded(&self, package: &str) -> bool {
        self.excluded_packages.iter().any(|p| p == package)
    }

    /// Apply one `key = value` override, e.g. `weights.geo_proximity = 4`.
    ///
    /// `exclude` / `include` add or remove a package from the exclusion set.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value.trim().parse().map_err(|_| {
                PredictorError::Config(format!("'{}' is not a valid value for {}", value, key))
            })
        }

        let w = &mut self.weights;
        match key {
            "weights.base" => w.base = number(key, value)?,
            "weights.same_hour" => w.same_hour = number(key, value)?,
            "weights.one_hour" => w.one_hour = number(key, value)?,
            "weights.two_hours" => w.two_hours = number(key, value)?,
            "weights.activity_match" => w.activity_match = number(key, value)?,
            "weights.headphones_match" => w.headphones_match = number(key, value)?,
            "weights.day_of_week_match" => w.day_of_week_match = number(key, value)?,
            "weights.geo_proximity" => w.geo_proximity = number(key, value)?,
            "weights.wifi_match" => w.wifi_match = number(key, value)?,
            "geo_radius_meters" => self.geo_radius_meters = number(key, value)?,
            "history_window_days" => self.history_window_days = number(key, value)?,
            "probability_window_hours" => self.probability_window_hours = number(key, value)?,
            "min_sample_size" => self.min_sample_size = number(key, value)?,
            "location_signal" => {
                self.location_signal = match value.trim().to_ascii_lowercase().as_str() {
                    "gps" => LocationSignal::Gps,
                    "wifi" => LocationSignal::Wifi,
                    other => {
                        return Err(PredictorError::Config(format!(
                            "unknown location signal '{}', expected gps or wifi",
                            other
                        )))
                    }
                }
            }
            "exclude" => {
                let package = value.trim().to_string();
                if !self.is_excluded(&package) {
                    self.excluded_packages.push(package);
                }
            }
            "include" => self.excluded_packages.retain(|p| p != value.trim()),
            _ => {
                return Err(PredictorError::Config(format!(
                    "unknown setting '{}'",
                    key
                )))
            }
        }

        self.validate()
    }

    /// Reject configs the engine can't use sensibly
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        let weights = [
            ("base", w.base),
            ("same_hour", w.same_hour),
            ("one_hour", w.one_hour),
            ("two_hours", w.two_hours),
            ("activity_match", w.activity_match),
            ("headphones_match", w.headphones_match),
            ("day_of_week_match", w.day_of_week_match),
            ("geo_proximity", w.geo_proximity),
            ("wifi_match", w.wifi_match),
        ];

        if let Some((name, value)) = weights.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(PredictorError::Config(format!(
                "weight '{}' must be a non-negative number, got {}",
                name, value
            )));
        }

        if !self.geo_radius_meters.is_finite() || self.geo_radius_meters < 0.0 {
            return Err(PredictorError::Config(
                "geo_radius_meters must be a non-negative number".to_string(),
            ));
        }

        if !(1..=MAX_HISTORY_WINDOW_DAYS).contains(&self.history_window_days) {
            return Err(PredictorError::Config(format!(
                "history_window_days must be between 1 and {}",
                MAX_HISTORY_WINDOW_DAYS
            )));
        }

        if self.min_sample_size == 0 {
            return Err(PredictorError::Config(
                "min_sample_size must be at least 1".to_string(),
            ));
        }

        if self.probability_window_hours > 12 {
            return Err(PredictorError::Config(
                "probability_window_hours can't exceed 12".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = PredictorConfig::default();

        assert_eq!(config.weights.same_hour, 3.0);
        assert_eq!(config.weights.geo_proximity, 5.0);
        assert_eq!(config.geo_radius_meters, 100.0);
        assert_eq!(config.history_window_days, 30);
        assert_eq!(config.min_sample_size, 5);
        assert_eq!(config.location_signal, LocationSignal::Gps);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_exclusion_set() {
        let config = PredictorConfig::default();

        assert!(config.is_excluded("com.android.systemui"));
        assert!(config.is_excluded("com.sec.android.app.launcher"));
        assert!(!config.is_excluded("com.spotify.music"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PredictorConfig =
            serde_json::from_str(r#"{"location_signal":"wifi","weights":{"wifi_match":4.0}}"#)
                .unwrap();

        assert_eq!(config.location_signal, LocationSignal::Wifi);
        assert_eq!(config.weights.wifi_match, 4.0);
        assert_eq!(config.weights.same_hour, SAME_HOUR_SCORE);
        assert_eq!(config.min_sample_size, MIN_SAMPLE_SIZE);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PredictorConfig::default();
        config.weights.activity_match = -1.0;
        assert!(config.validate().is_err());

        let mut config = PredictorConfig::default();
        config.history_window_days = 0;
        assert!(config.validate().is_err());

        let mut config = PredictorConfig::default();
        config.geo_radius_meters = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = PredictorConfig::default();
        config.history_window_days = 200_000_000_000;
        assert!(config.validate().is_err());

        let mut config = PredictorConfig::default();
        config.history_window_days = MAX_HISTORY_WINDOW_DAYS;
        assert!(config.validate().is_ok());

        let mut config = PredictorConfig::default();
        config.min_sample_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_overrides() {
        let mut config = PredictorConfig::default();

        config.set("weights.geo_proximity", "4.5").unwrap();
        config.set("location_signal", "WiFi").unwrap();
        config.set("min_sample_size", "8").unwrap();
        config.set("exclude", "com.miui.home").unwrap();
        config.set("include", "com.android.systemui").unwrap();

        assert_eq!(config.weights.geo_proximity, 4.5);
        assert_eq!(config.location_signal, LocationSignal::Wifi);
        assert_eq!(config.min_sample_size, 8);
        assert!(config.is_excluded("com.miui.home"));
        assert!(!config.is_excluded("com.android.systemui"));
    }

    #[test]
    fn test_set_rejects_garbage() {
        let mut config = PredictorConfig::default();

        assert!(config.set("weights.same_hour", "lots").is_err());
        assert!(config.set("location_signal", "bluetooth").is_err());
        assert!(config.set("warp_factor", "9").is_err());
        assert!(config.set("history_window_days", "-3").is_err());
        assert!(config.set("history_window_days", "200000000000").is_err());
        assert!(config.set("min_sample_size", "0").is_err());
    }

    #[test]
    fn test_wifi_variant() {
        let config = PredictorConfig::wifi_variant();
        assert_eq!(config.location_signal, LocationSignal::Wifi);
        assert_eq!(config.weights, ScoringWeights::default());
    }
}
