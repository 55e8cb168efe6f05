//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    BulkItem, BulkUpdateReport, ConfigScope, ConfigSnapshot, ConfigUpdateOutcome,
    DisableOptions, DisableOutcome, EnableOptions, FeatureAnalysis, FeatureCatalog, FeatureMap,
    FeatureStatus, FeatureToggleError, FeatureTogglesApi, ScopeExport, ToggleView,
};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;

/// Native client implementation that directly calls the domain service
///
/// This client is used for in-process communication without HTTP overhead.
/// Other modules hold it as `Arc<dyn FeatureTogglesApi>` to gate behaviour.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl FeatureTogglesApi for NativeClient {
    async fn catalog(&self) -> FeatureCatalog {
        self.service.catalog()
    }

    async fn is_enabled(&self, feature_id: &str, facility_id: Option<&str>) -> bool {
        self.service.is_enabled(feature_id, facility_id)
    }

    async fn global_config(&self) -> FeatureMap {
        self.service.global_config()
    }

    async fn effective_config(&self, facility_id: &str) -> Result<FeatureMap, FeatureToggleError> {
        self.service.effective_config(facility_id)
    }

    async fn check_feature(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
    ) -> Result<Option<FeatureStatus>, FeatureToggleError> {
        self.service.check_feature(feature_id, facility_id)
    }

    async fn toggle_view(
        &self,
        facility_id: Option<&str>,
    ) -> Result<ToggleView, FeatureToggleError> {
        self.service.toggle_view(facility_id)
    }

    async fn analysis(
        &self,
        facility_id: Option<&str>,
    ) -> Result<FeatureAnalysis, FeatureToggleError> {
        self.service.analysis(facility_id)
    }

    async fn set_global_config(
        &self,
        patch: FeatureMap,
    ) -> Result<ConfigUpdateOutcome, FeatureToggleError> {
        self.service.set_global_config(patch).await
    }

    async fn set_facility_config(
        &self,
        facility_id: &str,
        patch: FeatureMap,
    ) -> Result<ConfigUpdateOutcome, FeatureToggleError> {
        self.service.set_facility_config(facility_id, patch).await
    }

    async fn enable_feature(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
        options: EnableOptions,
    ) -> Result<ConfigUpdateOutcome, FeatureToggleError> {
        self.service
            .enable_feature(feature_id, facility_id, options)
            .await
    }

    async fn disable_feature(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
        options: DisableOptions,
    ) -> Result<DisableOutcome, FeatureToggleError> {
        self.service
            .disable_feature(feature_id, facility_id, options)
            .await
    }

    async fn bulk_update(
        &self,
        items: Vec<BulkItem>,
        facility_id: Option<&str>,
    ) -> Result<BulkUpdateReport, FeatureToggleError> {
        self.service.bulk_update(items, facility_id).await
    }

    async fn reset_facility(&self, facility_id: &str) -> Result<Vec<String>, FeatureToggleError> {
        self.service.reset_facility(facility_id).await
    }

    async fn export_snapshot(&self) -> ConfigSnapshot {
        self.service.export_snapshot()
    }

    async fn export_scope(&self, scope: ConfigScope) -> Result<ScopeExport, FeatureToggleError> {
        self.service.export_scope(&scope)
    }

    async fn import_snapshot(&self, snapshot: ConfigSnapshot) -> Result<(), FeatureToggleError> {
        self.service.import_snapshot(snapshot).await
    }

    async fn persist_snapshot(&self) -> Result<bool, FeatureToggleError> {
        self.service.persist_snapshot().await
    }
}
