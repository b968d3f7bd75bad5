/// Event retriever
///
/// The history-retrieval capability the engine depends on: a recency window
/// and a categorical filter over the event store.

use crate::db::{ContextEvent, Database};
use crate::error::Result;
use crate::intelligence::{Activity, Scorer};
use std::sync::Arc;

/// Categorical filter over stored events
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryFilter {
    Activity(Activity),
    App(String),
    WifiSsid(String),
}

/// Handles event retrieval operations
pub struct Retriever {
    db: Arc<Database>,
}

impl Retriever {
    /// Create a new retriever instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Events logged within the last `days` days before `now_ms`
    pub async fn events_within_days(&self, days: i64, now_ms: i64) -> Result<Vec<ContextEvent>> {
        let cutoff = Scorer::window_start(now_ms, days);
        let events = self.db.get_events_since(cutoff).await?;

        log::debug!("Fetched {} events from the last {} days", events.len(), days);

        Ok(events)
    }

    /// Events matching a categorical filter, across all history
    pub async fn events_matching(&self, filter: &HistoryFilter) -> Result<Vec<ContextEvent>> {
        match filter {
            HistoryFilter::Activity(activity) => {
                self.db.get_events_by_activity(&activity.to_string()).await
            }
            HistoryFilter::App(package) => self.db.get_events_by_app(package).await,
            HistoryFilter::WifiSsid(ssid) => self.db.get_events_by_wifi(ssid).await,
        }
    }

    /// Every stored event
    pub async fn all_events(&self) -> Result<Vec<ContextEvent>> {
        self.db.get_all_events().await
    }

    /// Latest events, newest first
    pub async fn latest(&self, limit: i64) -> Result<Vec<ContextEvent>> {
        self.db.get_latest_events(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ContextEventInput;
    use crate::intelligence::scorer::MILLIS_PER_DAY;
    use chrono::Utc;

    const NOW: i64 = 1_750_000_000_000;

    async fn setup() -> (Retriever, Arc<Database>) {
        let db = Arc::new(Database::new_test().await.unwrap());
        let retriever = Retriever::new(Arc::clone(&db));
        (retriever, db)
    }

    async fn insert(db: &Database, days_old: i64, app: &str, activity: Activity) {
        let mut input = ContextEventInput::observed_at(&Utc::now(), app)
            .with_activity(activity)
            .with_wifi("CafeNet");
        input.timestamp = NOW - days_old * MILLIS_PER_DAY;
        db.record_event(&input).await.unwrap();
    }

    #[tokio::test]
    async fn test_events_within_days() {
        let (retriever, db) = setup().await;

        insert(&db, 1, "com.slack", Activity::Still).await;
        insert(&db, 29, "com.slack", Activity::Still).await;
        insert(&db, 31, "com.slack", Activity::Still).await;

        let recent = retriever.events_within_days(30, NOW).await.unwrap();
        assert_eq!(recent.len(), 2);

        let all = retriever.all_events().await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_events_matching() {
        let (retriever, db) = setup().await;

        insert(&db, 0, "com.google.android.apps.maps", Activity::Driving).await;
        insert(&db, 0, "com.slack", Activity::Still).await;

        let driving = retriever
            .events_matching(&HistoryFilter::Activity(Activity::Driving))
            .await
            .unwrap();
        assert_eq!(driving.len(), 1);
        assert_eq!(driving[0].app_package_name, "com.google.android.apps.maps");

        let slack = retriever
            .events_matching(&HistoryFilter::App("com.slack".to_string()))
            .await
            .unwrap();
        assert_eq!(slack.len(), 1);

        let cafe = retriever
            .events_matching(&HistoryFilter::WifiSsid("CafeNet".to_string()))
            .await
            .unwrap();
        assert_eq!(cafe.len(), 2);
    }

    #[tokio::test]
    async fn test_latest() {
        let (retriever, db) = setup().await;

        insert(&db, 3, "com.old", Activity::Unknown).await;
        insert(&db, 0, "com.new", Activity::Unknown).await;

        let latest = retriever.latest(1).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].app_package_name, "com.new");
    }
}
