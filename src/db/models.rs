/// Data models for database entities
///
/// All models map to database tables and use sqlx for type-safe queries.

use crate::intelligence::{Activity, GeoPoint};
use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Package name logged when the foreground app could not be determined
pub const UNKNOWN_APP: &str = "UNKNOWN";

/// SSID logged when the device is not on Wi-Fi
pub const NO_WIFI: &str = "None";

/// One logged observation of what the user was doing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ContextEvent {
    pub id: i64,
    pub timestamp: i64, // epoch millis
    pub hour_of_day: i64,
    pub minute: i64,
    pub day_of_week: i64, // Sunday = 1
    pub activity_type: String,
    pub is_headphones_connected: bool,
    pub wifi_ssid: String,
    pub latitude: f64,
    pub longitude: f64,
    pub app_package_name: String,
}

impl ContextEvent {
    /// Parse the stored activity label
    pub fn activity(&self) -> Activity {
        Activity::parse(&self.activity_type)
    }

    /// Location the event was logged at (may be the unknown sentinel)
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// SSID if the device was on Wi-Fi
    pub fn wifi(&self) -> Option<&str> {
        if self.wifi_ssid == NO_WIFI || self.wifi_ssid.is_empty() {
            None
        } else {
            Some(&self.wifi_ssid)
        }
    }

    pub fn has_known_app(&self) -> bool {
        self.app_package_name != UNKNOWN_APP
    }
}

/// Input for appending a new event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextEventInput {
    pub timestamp: i64,
    pub hour_of_day: i64,
    pub minute: i64,
    pub day_of_week: i64,
    pub activity_type: String,
    pub is_headphones_connected: bool,
    pub wifi_ssid: String,
    pub latitude: f64,
    pub longitude: f64,
    pub app_package_name: String,
}

impl ContextEventInput {
    /// Start an event observed at `at`, with every context signal unknown.
    ///
    /// Hour, minute and weekday are taken from `at` in its own timezone, so
    /// pass a `DateTime<Local>` to log local wall-clock time.
    pub fn observed_at<Tz: TimeZone>(at: &DateTime<Tz>, app_package_name: &str) -> Self {
        Self {
            timestamp: at.timestamp_millis(),
            hour_of_day: at.hour() as i64,
            minute: at.minute() as i64,
            day_of_week: at.weekday().number_from_sunday() as i64,
            activity_type: Activity::Unknown.to_string(),
            is_headphones_connected: false,
            wifi_ssid: NO_WIFI.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            app_package_name: app_package_name.to_string(),
        }
    }

    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activity_type = activity.to_string();
        self
    }

    pub fn with_headphones(mut self, connected: bool) -> Self {
        self.is_headphones_connected = connected;
        self
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.latitude = location.latitude;
        self.longitude = location.longitude;
        self
    }

    pub fn with_wifi(mut self, ssid: &str) -> Self {
        self.wifi_ssid = ssid.to_string();
        self
    }

    /// Materialize as a stored event with the given row id
    pub fn into_event(self, id: i64) -> ContextEvent {
        ContextEvent {
            id,
            timestamp: self.timestamp,
            hour_of_day: self.hour_of_day,
            minute: self.minute,
            day_of_week: self.day_of_week,
            activity_type: self.activity_type,
            is_headphones_connected: self.is_headphones_connected,
            wifi_ssid: self.wifi_ssid,
            latitude: self.latitude,
            longitude: self.longitude,
            app_package_name: self.app_package_name,
        }
    }
}

/// User preference
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Preference {
    pub key: String,
    pub value: String,
}
