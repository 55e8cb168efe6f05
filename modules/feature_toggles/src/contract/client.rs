//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to gate on features.
//! NO HTTP - direct function calls for performance.

use super::{
    error::FeatureToggleError,
    model::{
        BulkItem, BulkUpdateReport, ConfigScope, ConfigSnapshot, ConfigUpdateOutcome,
        DisableOptions, DisableOutcome, EnableOptions, FeatureAnalysis, FeatureCatalog,
        FeatureMap, FeatureStatus, ScopeExport, ToggleView,
    },
};
use async_trait::async_trait;

/// Feature toggles API for inter-module communication
#[async_trait]
pub trait FeatureTogglesApi: Send + Sync {
    // ===== Reads =====

    /// List all feature definitions and categories
    async fn catalog(&self) -> FeatureCatalog;

    /// Whether a feature is on, globally or for a facility.
    ///
    /// Unknown features read as disabled.
    async fn is_enabled(&self, feature_id: &str, facility_id: Option<&str>) -> bool;

    /// Raw global configuration
    async fn global_config(&self) -> FeatureMap;

    /// Effective configuration of a facility
    async fn effective_config(&self, facility_id: &str) -> Result<FeatureMap, FeatureToggleError>;

    /// Single-feature check; `None` for unknown features
    async fn check_feature(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
    ) -> Result<Option<FeatureStatus>, FeatureToggleError>;

    /// Presentation view of every feature
    async fn toggle_view(&self, facility_id: Option<&str>)
        -> Result<ToggleView, FeatureToggleError>;

    /// Summary, per-category counts and dependency issues
    async fn analysis(&self, facility_id: Option<&str>)
        -> Result<FeatureAnalysis, FeatureToggleError>;

    // ===== Writes =====

    /// Validate and commit a partial global configuration
    async fn set_global_config(
        &self,
        patch: FeatureMap,
    ) -> Result<ConfigUpdateOutcome, FeatureToggleError>;

    /// Validate and commit partial facility overrides
    async fn set_facility_config(
        &self,
        facility_id: &str,
        patch: FeatureMap,
    ) -> Result<ConfigUpdateOutcome, FeatureToggleError>;

    /// Enable a feature, optionally with its dependency closure
    async fn enable_feature(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
        options: EnableOptions,
    ) -> Result<ConfigUpdateOutcome, FeatureToggleError>;

    /// Disable a feature unless enabled dependents block it
    async fn disable_feature(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
        options: DisableOptions,
    ) -> Result<DisableOutcome, FeatureToggleError>;

    /// Apply a list of enable/disable requests item by item
    async fn bulk_update(
        &self,
        items: Vec<BulkItem>,
        facility_id: Option<&str>,
    ) -> Result<BulkUpdateReport, FeatureToggleError>;

    /// Drop every override of a facility
    async fn reset_facility(&self, facility_id: &str) -> Result<Vec<String>, FeatureToggleError>;

    // ===== Backup =====

    async fn export_snapshot(&self) -> ConfigSnapshot;

    async fn export_scope(&self, scope: ConfigScope) -> Result<ScopeExport, FeatureToggleError>;

    /// Replace both layers without dependency validation. Trusted input only.
    async fn import_snapshot(&self, snapshot: ConfigSnapshot) -> Result<(), FeatureToggleError>;

    /// Save both layers to the configured snapshot store.
    ///
    /// `false` when persistence is not configured.
    async fn persist_snapshot(&self) -> Result<bool, FeatureToggleError>;
}
