//! Domain events for feature toggles
//!
//! Events carry the data an audit collaborator consumes; storage of the audit
//! trail lives outside this module.
//! - Audit events: one per committed mutation
//! - Notification events: sent to the facilities whose effective view changed

use crate::contract::{ConfigScope, FeatureChange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain event types for feature configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum FeatureEvent {
    /// Values of one scope were changed
    ConfigChanged(ConfigChangedEvent),
    /// All overrides of a facility were removed
    FacilityReset(FacilityResetEvent),
    /// Both layers were replaced from a snapshot
    SnapshotImported(SnapshotImportedEvent),
}

/// One value change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureChangeRecord {
    pub feature_id: String,
    pub previous: bool,
    pub current: bool,
}

/// Event data for a committed configuration change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChangedEvent {
    /// Facility the change applies to; `None` for the global layer
    pub facility_id: Option<String>,
    pub changes: Vec<FeatureChangeRecord>,
    /// Dependency checks were bypassed
    pub forced: bool,
    pub timestamp: DateTime<Utc>,
}

/// Event data for a facility reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityResetEvent {
    pub facility_id: String,
    /// Features whose overrides were removed
    pub removed_overrides: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Event data for a snapshot import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotImportedEvent {
    pub facility_count: usize,
    /// Keys of unregistered features that were skipped
    pub dropped_keys: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Event publisher trait for publishing domain events
///
/// Implementations should handle delivery and retries; the service logs
/// publishing failures and never fails the mutation because of them.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an audit event
    async fn publish_audit(&self, event: FeatureEvent) -> anyhow::Result<()>;

    /// Publish a notification event
    ///
    /// # Arguments
    /// * `event` - The event to publish
    /// * `facility_ids` - Facilities whose effective configuration changed
    async fn publish_notification(
        &self,
        event: FeatureEvent,
        facility_ids: Vec<String>,
    ) -> anyhow::Result<()>;
}

/// No-op event publisher for testing or when events are disabled
pub struct NoOpEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_audit(&self, _event: FeatureEvent) -> anyhow::Result<()> {
        Ok(())
    }

    async fn publish_notification(
        &self,
        _event: FeatureEvent,
        _facility_ids: Vec<String>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Publisher that writes events to the `feature_toggles::audit` tracing target
pub struct TracingEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish_audit(&self, event: FeatureEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&event)?;
        tracing::info!(target: "feature_toggles::audit", event = %payload, "feature audit event");
        Ok(())
    }

    async fn publish_notification(
        &self,
        event: FeatureEvent,
        facility_ids: Vec<String>,
    ) -> anyhow::Result<()> {
        if facility_ids.is_empty() {
            return Ok(());
        }
        let payload = serde_json::to_string(&event)?;
        tracing::info!(
            target: "feature_toggles::notification",
            facilities = ?facility_ids,
            event = %payload,
            "feature notification event"
        );
        Ok(())
    }
}

impl From<&FeatureChange> for FeatureChangeRecord {
    fn from(change: &FeatureChange) -> Self {
        Self {
            feature_id: change.feature_id.clone(),
            previous: change.previous,
            current: change.current,
        }
    }
}

impl FeatureEvent {
    /// Create a new ConfigChanged event
    pub fn config_changed(scope: &ConfigScope, changes: &[FeatureChange], forced: bool) -> Self {
        FeatureEvent::ConfigChanged(ConfigChangedEvent {
            facility_id: scope.facility_id().map(str::to_string),
            changes: changes.iter().map(FeatureChangeRecord::from).collect(),
            forced,
            timestamp: Utc::now(),
        })
    }

    /// Create a new FacilityReset event
    pub fn facility_reset(facility_id: &str, removed_overrides: Vec<String>) -> Self {
        FeatureEvent::FacilityReset(FacilityResetEvent {
            facility_id: facility_id.to_string(),
            removed_overrides,
            timestamp: Utc::now(),
        })
    }

    /// Create a new SnapshotImported event
    pub fn snapshot_imported(facility_count: usize, dropped_keys: Vec<String>) -> Self {
        FeatureEvent::SnapshotImported(SnapshotImportedEvent {
            facility_count,
            dropped_keys,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_changed_event_creation() {
        let changes = vec![FeatureChange {
            feature_id: "batches".into(),
            previous: false,
            current: true,
        }];

        let event = FeatureEvent::config_changed(
            &ConfigScope::Facility("north".into()),
            &changes,
            false,
        );

        match event {
            FeatureEvent::ConfigChanged(e) => {
                assert_eq!(e.facility_id.as_deref(), Some("north"));
                assert_eq!(e.changes.len(), 1);
                assert_eq!(e.changes[0].feature_id, "batches");
                assert!(!e.forced);
            }
            _ => panic!("Expected ConfigChanged event"),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = FeatureEvent::facility_reset("north", vec!["alerts".into()]);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event_type"], "facility_reset");
        assert_eq!(json["facility_id"], "north");
        assert_eq!(json["removed_overrides"][0], "alerts");
    }

    #[tokio::test]
    async fn test_noop_event_publisher() {
        let publisher = NoOpEventPublisher;
        let event = FeatureEvent::config_changed(&ConfigScope::Global, &[], true);

        assert!(publisher.publish_audit(event.clone()).await.is_ok());
        assert!(publisher
            .publish_notification(event, vec!["north".into()])
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_tracing_event_publisher() {
        let publisher = TracingEventPublisher;
        let event = FeatureEvent::snapshot_imported(2, Vec::new());

        assert!(publisher.publish_audit(event.clone()).await.is_ok());
        assert!(publisher.publish_notification(event, Vec::new()).await.is_ok());
    }
}
