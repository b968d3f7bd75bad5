/// SQL query functions for database operations
///
/// The event log is append-only: there is no update path, only inserts,
/// retention pruning and a full wipe.

use crate::db::models::*;
use crate::db::Database;
use crate::error::{PredictorError, Result};
use crate::intelligence::PredictorConfig;
use sqlx::Row;

/// Preference key the predictor config is stored under
pub const CONFIG_KEY: &str = "predictor_config";

impl Database {
    /// Append a new event
    ///
    /// # Returns
    /// * `Ok(i64)` - The new event ID
    pub async fn record_event(&self, input: &ContextEventInput) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO context_events (
                timestamp, hour_of_day, minute, day_of_week, activity_type,
                is_headphones_connected, wifi_ssid, latitude, longitude, app_package_name
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(input.timestamp)
        .bind(input.hour_of_day)
        .bind(input.minute)
        .bind(input.day_of_week)
        .bind(&input.activity_type)
        .bind(input.is_headphones_connected)
        .bind(&input.wifi_ssid)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.app_package_name)
        .fetch_one(self.pool())
        .await?;

        Ok(result.get(0))
    }

    /// Get every event in the store
    pub async fn get_all_events(&self) -> Result<Vec<ContextEvent>> {
        let events = sqlx::query_as::<_, ContextEvent>("SELECT * FROM context_events")
            .fetch_all(self.pool())
            .await?;

        Ok(events)
    }

    /// Get events logged strictly after `min_timestamp` (epoch millis)
    pub async fn get_events_since(&self, min_timestamp: i64) -> Result<Vec<ContextEvent>> {
        let events =
            sqlx::query_as::<_, ContextEvent>("SELECT * FROM context_events WHERE timestamp > ?")
                .bind(min_timestamp)
                .fetch_all(self.pool())
                .await?;

        Ok(events)
    }

    /// Get the latest events, newest first
    pub async fn get_latest_events(&self, limit: i64) -> Result<Vec<ContextEvent>> {
        let events = sqlx::query_as::<_, ContextEvent>(
            "SELECT * FROM context_events ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(events)
    }

    /// Get events logged while doing `activity` (e.g. "DRIVING")
    pub async fn get_events_by_activity(&self, activity: &str) -> Result<Vec<ContextEvent>> {
        let events = sqlx::query_as::<_, ContextEvent>(
            "SELECT * FROM context_events WHERE activity_type = ?",
        )
        .bind(activity)
        .fetch_all(self.pool())
        .await?;

        Ok(events)
    }

    /// Get events where `package` was in the foreground
    pub async fn get_events_by_app(&self, package: &str) -> Result<Vec<ContextEvent>> {
        let events = sqlx::query_as::<_, ContextEvent>(
            "SELECT * FROM context_events WHERE app_package_name = ?",
        )
        .bind(package)
        .fetch_all(self.pool())
        .await?;

        Ok(events)
    }

    /// Get events logged while connected to `ssid`
    pub async fn get_events_by_wifi(&self, ssid: &str) -> Result<Vec<ContextEvent>> {
        let events =
            sqlx::query_as::<_, ContextEvent>("SELECT * FROM context_events WHERE wifi_ssid = ?")
                .bind(ssid)
                .fetch_all(self.pool())
                .await?;

        Ok(events)
    }

    /// Count stored events
    pub async fn count_events(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM context_events")
            .fetch_one(self.pool())
            .await?;

        Ok(count.0)
    }

    /// Delete events logged before `cutoff` (epoch millis)
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of events removed
    pub async fn delete_events_before(&self, cutoff: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM context_events WHERE timestamp < ?")
            .bind(cutoff)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove every event
    pub async fn wipe_events(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM context_events")
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Get a preference
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let pref = sqlx::query_as::<_, Preference>("SELECT * FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;

        Ok(pref.map(|p| p.value))
    }

    /// Set a preference
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO preferences (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Remove a preference
    pub async fn delete_preference(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Load the predictor config, falling back to defaults if none is stored
    pub async fn load_config(&self) -> Result<PredictorConfig> {
        match self.get_preference(CONFIG_KEY).await? {
            Some(json) => {
                let config: PredictorConfig = serde_json::from_str(&json).map_err(|e| {
                    PredictorError::Config(format!("stored predictor config is malformed: {}", e))
                })?;
                config.validate()?;
                Ok(config)
            }
            None => Ok(PredictorConfig::default()),
        }
    }

    /// Persist the predictor config
    pub async fn save_config(&self, config: &PredictorConfig) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string(config)?;
        self.set_preference(CONFIG_KEY, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::{Activity, LocationSignal};

    fn event_at(timestamp: i64, app: &str) -> ContextEventInput {
        ContextEventInput {
            timestamp,
            hour_of_day: 9,
            minute: 15,
            day_of_week: 2,
            activity_type: "STILL".to_string(),
            is_headphones_connected: true,
            wifi_ssid: "Office".to_string(),
            latitude: 48.8566,
            longitude: 2.3522,
            app_package_name: app.to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let db = Database::new_test().await.unwrap();

        let input = event_at(1_700_000_000_000, "com.slack");
        let id = db.record_event(&input).await.unwrap();
        assert!(id > 0);

        let all = db.get_all_events().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], input.into_event(id));
    }

    #[tokio::test]
    async fn test_events_since_is_exclusive() {
        let db = Database::new_test().await.unwrap();

        db.record_event(&event_at(1_000, "a.old")).await.unwrap();
        db.record_event(&event_at(2_000, "b.edge")).await.unwrap();
        db.record_event(&event_at(3_000, "c.new")).await.unwrap();

        let since = db.get_events_since(2_000).await.unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].app_package_name, "c.new");
    }

    #[tokio::test]
    async fn test_latest_events_ordering() {
        let db = Database::new_test().await.unwrap();

        for i in 1..=5 {
            db.record_event(&event_at(i * 1_000, &format!("app.n{}", i)))
                .await
                .unwrap();
        }

        let latest = db.get_latest_events(3).await.unwrap();
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].app_package_name, "app.n5");
    }

    #[tokio::test]
    async fn test_categorical_filters() {
        let db = Database::new_test().await.unwrap();

        let driving = event_at(1_000, "com.google.android.apps.maps")
            .with_activity(Activity::Driving)
            .with_wifi("None");
        db.record_event(&driving).await.unwrap();
        db.record_event(&event_at(2_000, "com.slack")).await.unwrap();

        assert_eq!(db.get_events_by_activity("DRIVING").await.unwrap().len(), 1);
        assert_eq!(db.get_events_by_app("com.slack").await.unwrap().len(), 1);
        assert_eq!(db.get_events_by_wifi("Office").await.unwrap().len(), 1);
        assert_eq!(db.count_events().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_prune_and_wipe() {
        let db = Database::new_test().await.unwrap();

        for ts in [1_000, 2_000, 3_000] {
            db.record_event(&event_at(ts, "com.slack")).await.unwrap();
        }

        assert_eq!(db.delete_events_before(2_500).await.unwrap(), 2);
        assert_eq!(db.count_events().await.unwrap(), 1);

        assert_eq!(db.wipe_events().await.unwrap(), 1);
        assert_eq!(db.count_events().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_preferences() {
        let db = Database::new_test().await.unwrap();

        db.set_preference("watched_app", "com.google.android.apps.maps")
            .await
            .unwrap();

        let value = db.get_preference("watched_app").await.unwrap();
        assert_eq!(value, Some("com.google.android.apps.maps".to_string()));

        db.delete_preference("watched_app").await.unwrap();
        assert_eq!(db.get_preference("watched_app").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_config_round_trip_and_defaults() {
        let db = Database::new_test().await.unwrap();

        assert_eq!(db.load_config().await.unwrap(), PredictorConfig::default());

        let mut config = PredictorConfig::default();
        config.location_signal = LocationSignal::Wifi;
        config.weights.geo_proximity = 7.5;
        db.save_config(&config).await.unwrap();

        assert_eq!(db.load_config().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_malformed_config_is_an_error() {
        let db = Database::new_test().await.unwrap();

        db.set_preference(CONFIG_KEY, "{not json").await.unwrap();

        match db.load_config().await {
            Err(PredictorError::Config(_)) => {}
            other => panic!("Expected Config error, got {:?}", other),
        }
    }
}
