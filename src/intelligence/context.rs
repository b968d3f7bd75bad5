/// Context snapshot for live predictions
///
/// Describes what the user is doing right now. Signals a deployment can't
/// observe are left at their neutral value and never earn a bonus.

use crate::intelligence::GeoPoint;
use chrono::{Datelike, Local, Timelike};

/// Physical activity as reported by the activity recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Activity {
    Still,
    Walking,
    Running,
    Driving,
    Cycling,
    #[default]
    Unknown,
}

impl Activity {
    /// Parse a logged label. Anything unrecognized is `Unknown`.
    pub fn parse(label: &str) -> Activity {
        match label.trim().to_ascii_uppercase().as_str() {
            "STILL" => Activity::Still,
            "WALKING" => Activity::Walking,
            "RUNNING" => Activity::Running,
            "DRIVING" | "IN_VEHICLE" => Activity::Driving,
            "CYCLING" | "ON_BICYCLE" => Activity::Cycling,
            _ => Activity::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Activity::Unknown
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activity::Still => write!(f, "STILL"),
            Activity::Walking => write!(f, "WALKING"),
            Activity::Running => write!(f, "RUNNING"),
            Activity::Driving => write!(f, "DRIVING"),
            Activity::Cycling => write!(f, "CYCLING"),
            Activity::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// The live query input
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    /// 0-23. May be a simulated hour; the engine doesn't care.
    pub hour: u32,
    pub headphones: bool,
    pub location: GeoPoint,
    pub activity: Activity,
    /// Connected network, `None` when not on Wi-Fi
    pub wifi_ssid: Option<String>,
    /// 1-7 with Sunday = 1. `None` means "today".
    pub day_of_week: Option<u32>,
}

impl ContextSnapshot {
    /// Snapshot for `hour` with every other signal neutral
    pub fn at_hour(hour: u32) -> Self {
        Self {
            hour: hour % 24,
            headphones: false,
            location: GeoPoint::UNKNOWN,
            activity: Activity::Unknown,
            wifi_ssid: None,
            day_of_week: None,
        }
    }

    /// Snapshot for the current local hour
    pub fn now() -> Self {
        Self::at_hour(current_hour())
    }

    pub fn with_headphones(mut self, connected: bool) -> Self {
        self.headphones = connected;
        self
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = location;
        self
    }

    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activity = activity;
        self
    }

    /// Set the connected SSID. "None" and empty strings mean no Wi-Fi.
    pub fn with_wifi(mut self, ssid: &str) -> Self {
        let ssid = ssid.trim();
        self.wifi_ssid = if ssid.is_empty() || ssid == crate::db::NO_WIFI {
            None
        } else {
            Some(ssid.to_string())
        };
        self
    }

    pub fn with_day_of_week(mut self, day: u32) -> Self {
        self.day_of_week = Some(day);
        self
    }

    /// Day of week to score against, defaulting to today
    pub fn effective_day_of_week(&self) -> u32 {
        self.day_of_week.unwrap_or_else(current_day_of_week)
    }
}

/// Current local hour, 0-23
pub fn current_hour() -> u32 {
    Local::now().hour()
}

/// Current local weekday, Sunday = 1
pub fn current_day_of_week() -> u32 {
    Local::now().weekday().number_from_sunday()
}
