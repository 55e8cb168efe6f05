//! Common test utilities and a small shared feature catalog
#![allow(dead_code)]

use async_trait::async_trait;
use feature_toggles::contract::{
    ConfigSnapshot, FeatureCategory, FeatureDefinition, FeatureMap, FeatureScope,
};
use feature_toggles::domain::{
    EventPublisher, FeatureEvent, FeatureRegistry, NoOpEventPublisher, Service,
    SnapshotRepository,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub const NORTH: &str = "warehouse-north";
pub const SOUTH: &str = "warehouse-south";

pub fn feature(
    id: &str,
    category: FeatureCategory,
    dependencies: &[&str],
    default_enabled: bool,
    scope: FeatureScope,
) -> FeatureDefinition {
    FeatureDefinition {
        id: id.to_string(),
        name: id.to_uppercase(),
        description: format!("Test feature {}", id),
        category,
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        default_enabled,
        scope,
    }
}

/// Test catalog
///
/// a <- b, d <- e (d requires e), c standalone,
/// audit (system only, on) <- reports
pub fn test_catalog() -> Vec<FeatureDefinition> {
    vec![
        feature("a", FeatureCategory::Core, &[], false, FeatureScope::BOTH),
        feature("b", FeatureCategory::Core, &["a"], false, FeatureScope::BOTH),
        feature("c", FeatureCategory::Inventory, &[], false, FeatureScope::BOTH),
        feature("d", FeatureCategory::Warehouse, &["e"], false, FeatureScope::BOTH),
        feature("e", FeatureCategory::Warehouse, &[], false, FeatureScope::BOTH),
        feature("audit", FeatureCategory::Administration, &[], true, FeatureScope::SYSTEM),
        feature("reports", FeatureCategory::Reporting, &["audit"], false, FeatureScope::BOTH),
    ]
}

pub fn test_registry() -> Arc<FeatureRegistry> {
    Arc::new(FeatureRegistry::new(test_catalog()).unwrap())
}

pub fn test_service() -> Arc<Service> {
    Arc::new(Service::new(test_registry(), Arc::new(NoOpEventPublisher)))
}

pub fn test_service_with_recorder() -> (Arc<Service>, Arc<RecordingPublisher>) {
    let recorder = Arc::new(RecordingPublisher::default());
    let service = Arc::new(Service::new(test_registry(), recorder.clone()));
    (service, recorder)
}

pub fn test_service_with_snapshots(repository: Arc<dyn SnapshotRepository>) -> Arc<Service> {
    let service = Service::new(test_registry(), Arc::new(NoOpEventPublisher));
    Arc::new(service.with_snapshot_repository(repository))
}

pub fn map(pairs: &[(&str, bool)]) -> FeatureMap {
    pairs.iter().map(|(id, on)| (id.to_string(), *on)).collect()
}

/// Publisher that keeps every event for inspection
#[derive(Default)]
pub struct RecordingPublisher {
    pub audits: Mutex<Vec<FeatureEvent>>,
    pub notifications: Mutex<Vec<(FeatureEvent, Vec<String>)>>,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_audit(&self, event: FeatureEvent) -> anyhow::Result<()> {
        self.audits.lock().push(event);
        Ok(())
    }

    async fn publish_notification(
        &self,
        event: FeatureEvent,
        facility_ids: Vec<String>,
    ) -> anyhow::Result<()> {
        self.notifications.lock().push((event, facility_ids));
        Ok(())
    }
}

/// Snapshot store whose backend is always down
pub struct FailingSnapshotRepository;

#[async_trait]
impl SnapshotRepository for FailingSnapshotRepository {
    async fn load(&self) -> anyhow::Result<Option<ConfigSnapshot>> {
        anyhow::bail!("snapshot backend unavailable")
    }

    async fn save(&self, _snapshot: &ConfigSnapshot) -> anyhow::Result<()> {
        anyhow::bail!("snapshot backend unavailable")
    }
}

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}
