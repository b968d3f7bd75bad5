// Records context events to the store
//
// The logger upstream is sloppy: blank package names, empty SSIDs, NaN
// coordinates. Normalize what can be normalized, reject what can't.

use crate::db::{ContextEventInput, Database, NO_WIFI, UNKNOWN_APP};
use crate::error::{PredictorError, Result};
use crate::intelligence::{Activity, ContextSnapshot, Scorer};
use chrono::{Local, Utc};
use regex::Regex;
use std::sync::Arc;

// Android-style package identifiers: dot-separated segments of word chars
const PACKAGE_PATTERN: &str = r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)*$";

// Nobody's package name is this long
const MAX_PACKAGE_LENGTH: usize = 255;

pub struct Recorder {
    db: Arc<Database>,
    package_regex: Option<Regex>,
}

impl Recorder {
    pub fn new(db: Arc<Database>) -> Self {
        // Compile once so we don't rebuild it for every event
        Self {
            db,
            package_regex: Regex::new(PACKAGE_PATTERN).ok(),
        }
    }

    // Main recording function. Checks the event, cleans it up, appends it.
    pub async fn record(&self, input: ContextEventInput) -> Result<i64> {
        let normalized = self.normalize(input)?;
        let id = self.db.record_event(&normalized).await?;

        log::debug!(
            "Recorded event {} for {} at {:02}:{:02}",
            id,
            normalized.app_package_name,
            normalized.hour_of_day,
            normalized.minute
        );

        Ok(id)
    }

    /// Log what the user is doing right now.
    ///
    /// The timestamp and minute come from the local clock. Hour and weekday
    /// come from the snapshot, so a snapshot built for another hour or day
    /// is stored as such.
    pub async fn record_now(&self, app_package_name: &str, context: &ContextSnapshot) -> Result<i64> {
        let mut input = ContextEventInput::observed_at(&Local::now(), app_package_name)
            .with_activity(context.activity)
            .with_headphones(context.headphones)
            .with_location(context.location)
            .with_wifi(context.wifi_ssid.as_deref().unwrap_or(NO_WIFI));
        input.hour_of_day = context.hour as i64;
        input.day_of_week = context.effective_day_of_week() as i64;

        self.record(input).await
    }

    /// Batch record multiple events
    ///
    /// Bad events are logged and skipped, the rest still go in.
    pub async fn record_batch(&self, inputs: Vec<ContextEventInput>) -> Result<Vec<i64>> {
        let mut ids = Vec::new();

        for input in inputs {
            let app = input.app_package_name.clone();
            match self.record(input).await {
                Ok(id) => ids.push(id),
                Err(PredictorError::InvalidEvent(reason)) => {
                    log::warn!("Skipping event for '{}': {}", app, reason);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(ids)
    }

    /// Drop events older than `retention_days`
    pub async fn prune(&self, retention_days: i64) -> Result<u64> {
        if retention_days <= 0 {
            return Err(PredictorError::Config(
                "retention must be at least one day".to_string(),
            ));
        }

        let cutoff = Scorer::window_start(Utc::now().timestamp_millis(), retention_days);
        let removed = self.db.delete_events_before(cutoff).await?;

        log::info!("Pruned {} events older than {} days", removed, retention_days);

        Ok(removed)
    }

    fn is_package_identifier(&self, package: &str) -> bool {
        self.package_regex
            .as_ref()
            .map_or(true, |regex| regex.is_match(package))
    }

    /// Validate ranges and replace missing signals with their sentinels
    fn normalize(&self, mut input: ContextEventInput) -> Result<ContextEventInput> {
        if !(0..=23).contains(&input.hour_of_day) {
            return Err(PredictorError::InvalidEvent(format!(
                "hour {} out of range 0-23",
                input.hour_of_day
            )));
        }

        if !(0..=59).contains(&input.minute) {
            return Err(PredictorError::InvalidEvent(format!(
                "minute {} out of range 0-59",
                input.minute
            )));
        }

        if !(1..=7).contains(&input.day_of_week) {
            return Err(PredictorError::InvalidEvent(format!(
                "day of week {} out of range 1-7",
                input.day_of_week
            )));
        }

        if input.timestamp <= 0 {
            return Err(PredictorError::InvalidEvent(format!(
                "timestamp {} is not a valid epoch time",
                input.timestamp
            )));
        }

        let package = input.app_package_name.trim();
        input.app_package_name = if package.is_empty() {
            UNKNOWN_APP.to_string()
        } else if package == UNKNOWN_APP {
            package.to_string()
        } else if package.len() > MAX_PACKAGE_LENGTH || !self.is_package_identifier(package) {
            return Err(PredictorError::InvalidEvent(format!(
                "'{}' is not a package identifier",
                package
            )));
        } else {
            package.to_string()
        };

        input.activity_type = Activity::parse(&input.activity_type).to_string();

        let ssid = input.wifi_ssid.trim();
        input.wifi_ssid = if ssid.is_empty() {
            NO_WIFI.to_string()
        } else {
            ssid.to_string()
        };

        if !input.latitude.is_finite()
            || !input.longitude.is_finite()
            || input.latitude.abs() > 90.0
            || input.longitude.abs() > 180.0
        {
            input.latitude = 0.0;
            input.longitude = 0.0;
        }

        Ok(input)
    }
}
