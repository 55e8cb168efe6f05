//! Domain service - feature toggle orchestration
//!
//! The service is the only mutator of the configuration store. Every write
//! validates under an upgradable read lock (readers keep going, writers are
//! serialised), then upgrades to commit. Locks are never held across `.await`;
//! events are published after the store is released.
//!
//! An unforced write must leave the written scope free of violations. A global
//! write must also not break any facility that inherits the changed values.

use crate::contract::{
    BulkItem, BulkItemError, BulkItemOutcome, BulkItemResult, BulkUpdateReport, ConfigScope,
    ConfigSnapshot, ConfigSummary, ConfigUpdateOutcome, DisableOptions, DisableOutcome,
    EnableOptions, FeatureAnalysis, FeatureCatalog, FeatureChange, FeatureDefinition, FeatureMap,
    FeatureStatus, FeatureToggleError, ScopeExport, ToggleEntry, ToggleView, Violation,
};
use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use super::analysis::AnalysisReporter;
use super::events::{EventPublisher, FeatureEvent};
use super::registry::FeatureRegistry;
use super::repository::SnapshotRepository;
use super::resolver::DependencyResolver;
use super::store::{ConfigPatch, ConfigurationStore};
use super::validation::validate_facility_id;

/// A mutation that reached the store
struct Committed {
    scope: ConfigScope,
    applied: Vec<String>,
    changes: Vec<FeatureChange>,
    /// Facilities whose effective view changed
    notify: Vec<String>,
    forced: bool,
}

enum Commit {
    Applied(Committed),
    Rejected(Vec<Violation>),
}

enum DisablePlan {
    Committed(Committed),
    Blocked {
        blocked_by: Vec<String>,
        facilities: Vec<String>,
    },
}

/// Current view of a scope: raw global values or a facility's effective values
fn read_scope(store: &ConfigurationStore, scope: &ConfigScope) -> FeatureMap {
    match scope {
        ConfigScope::Global => store.read_global(),
        ConfigScope::Facility(facility_id) => store.read_effective(facility_id),
    }
}

/// Domain service for feature toggles
pub struct Service {
    registry: Arc<FeatureRegistry>,
    store: RwLock<ConfigurationStore>,
    event_publisher: Arc<dyn EventPublisher>,
    snapshots: Option<Arc<dyn SnapshotRepository>>,
}

impl Service {
    /// Create a new service with the global layer seeded from catalog defaults
    pub fn new(registry: Arc<FeatureRegistry>, event_publisher: Arc<dyn EventPublisher>) -> Self {
        let store = ConfigurationStore::seed_global(registry.clone());
        tracing::info!(features = registry.len(), "Global feature configuration seeded");
        Self {
            registry,
            store: RwLock::new(store),
            event_publisher,
            snapshots: None,
        }
    }

    /// Enable `persist_snapshot` against the given repository
    pub fn with_snapshot_repository(mut self, repository: Arc<dyn SnapshotRepository>) -> Self {
        self.snapshots = Some(repository);
        self
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    fn resolver(&self) -> DependencyResolver<'_> {
        DependencyResolver::new(&self.registry)
    }

    // ===== Reads =====

    pub fn catalog(&self) -> FeatureCatalog {
        self.registry.catalog()
    }

    /// Fail-open read: unknown features are reported as disabled
    pub fn is_enabled(&self, feature_id: &str, facility_id: Option<&str>) -> bool {
        let value = {
            let store = self.store.read();
            match facility_id {
                Some(facility_id) => store.effective_value(feature_id, facility_id),
                None => store.global_value(feature_id),
            }
        };

        value.unwrap_or_else(|| {
            tracing::warn!(
                feature_id,
                ?facility_id,
                "Unknown feature checked, reporting disabled"
            );
            false
        })
    }

    pub fn global_config(&self) -> FeatureMap {
        self.store.read().read_global()
    }

    pub fn effective_config(&self, facility_id: &str) -> Result<FeatureMap, FeatureToggleError> {
        validate_facility_id(facility_id)?;
        Ok(self.store.read().read_effective(facility_id))
    }

    /// Explicit overrides only
    pub fn facility_overrides(&self, facility_id: &str) -> Result<FeatureMap, FeatureToggleError> {
        validate_facility_id(facility_id)?;
        Ok(self.store.read().read_facility_overrides(facility_id))
    }

    /// Facilities that have stored overrides
    pub fn list_facilities(&self) -> Vec<String> {
        self.store.read().facility_ids()
    }

    pub fn check_feature(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
    ) -> Result<Option<FeatureStatus>, FeatureToggleError> {
        let scope = self.scope_for(facility_id)?;
        if !self.registry.contains(feature_id) {
            tracing::warn!(feature_id, "Unknown feature checked");
            return Ok(None);
        }

        let config = read_scope(&self.store.read(), &scope);
        let resolver = self.resolver();
        Ok(Some(FeatureStatus {
            feature_id: feature_id.to_string(),
            enabled: config.get(feature_id).copied().unwrap_or(false),
            dependents: resolver.find_dependents(feature_id, &config),
            missing_dependencies: resolver.missing_dependencies(feature_id, &config),
        }))
    }

    /// Presentation view; `can_toggle` follows the caller's context
    pub fn toggle_view(
        &self,
        facility_id: Option<&str>,
    ) -> Result<ToggleView, FeatureToggleError> {
        let scope = self.scope_for(facility_id)?;
        let config = read_scope(&self.store.read(), &scope);
        let resolver = self.resolver();

        Ok(self
            .registry
            .all()
            .iter()
            .map(|definition| {
                let can_toggle = match scope {
                    ConfigScope::Global => definition.scope.system_level,
                    ConfigScope::Facility(_) => definition.scope.facility_level,
                };
                let entry = ToggleEntry {
                    enabled: config.get(&definition.id).copied().unwrap_or(false),
                    definition: definition.clone(),
                    can_toggle,
                    dependents: resolver.find_dependents(&definition.id, &config),
                    missing_dependencies: resolver.missing_dependencies(&definition.id, &config),
                };
                (definition.id.clone(), entry)
            })
            .collect())
    }

    pub fn summary(&self, facility_id: Option<&str>) -> Result<ConfigSummary, FeatureToggleError> {
        self.scope_for(facility_id)?;
        let store = self.store.read();
        Ok(AnalysisReporter::new(&self.registry, &store).summary(facility_id))
    }

    pub fn analysis(
        &self,
        facility_id: Option<&str>,
    ) -> Result<FeatureAnalysis, FeatureToggleError> {
        self.scope_for(facility_id)?;
        let store = self.store.read();
        Ok(AnalysisReporter::new(&self.registry, &store).analysis(facility_id))
    }

    pub fn export_snapshot(&self) -> ConfigSnapshot {
        let store = self.store.read();
        AnalysisReporter::new(&self.registry, &store).export_snapshot()
    }

    pub fn export_scope(&self, scope: &ConfigScope) -> Result<ScopeExport, FeatureToggleError> {
        if let Some(facility_id) = scope.facility_id() {
            validate_facility_id(facility_id)?;
        }
        let store = self.store.read();
        Ok(AnalysisReporter::new(&self.registry, &store).export_scope(scope))
    }

    // ===== Writes =====

    /// Validate a partial global configuration and commit it atomically.
    ///
    /// Rejected when the merged global map has a violation or when an
    /// inheriting facility would be left with a new one. On success every
    /// facility's inheritance is re-derived before returning.
    pub async fn set_global_config(
        &self,
        patch: FeatureMap,
    ) -> Result<ConfigUpdateOutcome, FeatureToggleError> {
        let patch = ConfigPatch::parse(&self.registry, &patch)?;
        let commit = self.commit(self.store.upgradable_read(), ConfigScope::Global, patch, false);
        Ok(self.finish(commit).await)
    }

    /// Validate partial overrides against the facility's effective view and commit them
    pub async fn set_facility_config(
        &self,
        facility_id: &str,
        patch: FeatureMap,
    ) -> Result<ConfigUpdateOutcome, FeatureToggleError> {
        validate_facility_id(facility_id)?;
        let patch = ConfigPatch::parse_for_facility(&self.registry, &patch)?;
        let scope = ConfigScope::Facility(facility_id.to_string());
        let commit = self.commit(self.store.upgradable_read(), scope, patch, false);
        Ok(self.finish(commit).await)
    }

    pub async fn enable_feature(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
        options: EnableOptions,
    ) -> Result<ConfigUpdateOutcome, FeatureToggleError> {
        let commit = self.plan_enable(feature_id, facility_id, options)?;
        Ok(self.finish(commit).await)
    }

    pub async fn disable_feature(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
        options: DisableOptions,
    ) -> Result<DisableOutcome, FeatureToggleError> {
        match self.plan_disable(feature_id, facility_id, options)? {
            DisablePlan::Blocked {
                blocked_by,
                facilities,
            } => {
                tracing::debug!(
                    feature_id,
                    ?blocked_by,
                    ?facilities,
                    "Disable refused, dependents enabled"
                );
                Ok(DisableOutcome::Blocked {
                    blocked_by,
                    facilities,
                })
            }
            DisablePlan::Committed(committed) => {
                let applied = committed.applied.clone();
                let forced = committed.forced;
                self.publish_changes(committed).await;
                Ok(DisableOutcome::Disabled { applied, forced })
            }
        }
    }

    /// Apply items in order; each item is its own atomic enable/disable
    pub async fn bulk_update(
        &self,
        items: Vec<BulkItem>,
        facility_id: Option<&str>,
    ) -> Result<BulkUpdateReport, FeatureToggleError> {
        self.scope_for(facility_id)?;

        let mut report = BulkUpdateReport::default();
        for item in items {
            let result = if item.enabled {
                self.enable_feature(&item.feature_id, facility_id, EnableOptions::default())
                    .await
                    .map(BulkItemOutcome::Enable)
            } else {
                self.disable_feature(&item.feature_id, facility_id, DisableOptions::default())
                    .await
                    .map(BulkItemOutcome::Disable)
            };

            match result {
                Ok(outcome) => report.results.push(BulkItemResult {
                    feature_id: item.feature_id,
                    enabled: item.enabled,
                    outcome,
                }),
                Err(error) => report.errors.push(BulkItemError {
                    feature_id: item.feature_id,
                    error,
                }),
            }
        }
        Ok(report)
    }

    /// Remove all overrides of a facility; it inherits the global layer again
    pub async fn reset_facility(
        &self,
        facility_id: &str,
    ) -> Result<Vec<String>, FeatureToggleError> {
        validate_facility_id(facility_id)?;
        let removed = self.store.write().reset_facility(facility_id);

        if !removed.is_empty() {
            tracing::info!(facility_id, overrides = removed.len(), "Facility overrides reset");
            let event = FeatureEvent::facility_reset(facility_id, removed.clone());
            self.publish(event, vec![facility_id.to_string()]).await;
        }
        Ok(removed)
    }

    /// Replace both layers from a trusted snapshot.
    ///
    /// No dependency validation is performed; never feed untrusted input here.
    pub async fn import_snapshot(
        &self,
        snapshot: ConfigSnapshot,
    ) -> Result<(), FeatureToggleError> {
        for facility_id in snapshot.facilities.keys() {
            validate_facility_id(facility_id)?;
        }

        let facility_count = snapshot.facilities.len();
        tracing::warn!(
            facility_count,
            "Importing configuration snapshot without dependency validation"
        );
        let dropped = self.store.write().import(snapshot);
        if !dropped.is_empty() {
            tracing::warn!(?dropped, "Snapshot keys for unregistered features were skipped");
        }

        let facilities = self.list_facilities();
        self.publish(FeatureEvent::snapshot_imported(facility_count, dropped), facilities)
            .await;
        Ok(())
    }

    /// Save both layers through the snapshot repository.
    ///
    /// Returns `false` when no repository is configured. Storage failures are
    /// logged and surface as `Internal`.
    pub async fn persist_snapshot(&self) -> Result<bool, FeatureToggleError> {
        let Some(repository) = &self.snapshots else {
            return Ok(false);
        };

        let snapshot = self.export_snapshot();
        if let Err(e) = repository.save(&snapshot).await {
            tracing::error!(error = ?e, "Failed to persist feature configuration snapshot");
            return Err(FeatureToggleError::Internal);
        }
        tracing::info!(
            facilities = snapshot.facilities.len(),
            "Feature configuration persisted"
        );
        Ok(true)
    }

    // ===== Helper Methods =====

    fn scope_for(&self, facility_id: Option<&str>) -> Result<ConfigScope, FeatureToggleError> {
        match facility_id {
            Some(facility_id) => {
                validate_facility_id(facility_id)?;
                Ok(ConfigScope::Facility(facility_id.to_string()))
            }
            None => Ok(ConfigScope::Global),
        }
    }

    fn require_feature(&self, feature_id: &str) -> Result<&FeatureDefinition, FeatureToggleError> {
        self.registry
            .get(feature_id)
            .ok_or_else(|| FeatureToggleError::unknown_feature(feature_id))
    }

    /// Facilities may only write facility-level features
    fn ensure_writable(
        definition: &FeatureDefinition,
        scope: &ConfigScope,
    ) -> Result<(), FeatureToggleError> {
        match scope {
            ConfigScope::Facility(_) if !definition.scope.facility_level => {
                Err(FeatureToggleError::NotFacilityScoped {
                    feature_id: definition.id.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn plan_enable(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
        options: EnableOptions,
    ) -> Result<Commit, FeatureToggleError> {
        let scope = self.scope_for(facility_id)?;
        let definition = self.require_feature(feature_id)?;
        Self::ensure_writable(definition, &scope)?;

        let store = self.store.upgradable_read();
        let mut patch = ConfigPatch::default();
        if options.auto_enable_dependencies {
            // Only dependencies that are off get written: already-enabled ones
            // stay inherited instead of being pinned as overrides.
            let current = read_scope(&store, &scope);
            for id in self.resolver().resolve_closure(feature_id) {
                let already_enabled = current.get(&id).copied().unwrap_or(false);
                let writable = self
                    .registry
                    .get(&id)
                    .is_some_and(|d| Self::ensure_writable(d, &scope).is_ok());
                if id == feature_id || (!already_enabled && writable) {
                    patch.set(id, true);
                }
            }
        } else {
            patch.set(feature_id, true);
        }

        if options.force {
            tracing::warn!(
                feature_id,
                %scope,
                "Force-enabling feature without dependency validation"
            );
        }
        Ok(self.commit(store, scope, patch, options.force))
    }

    fn plan_disable(
        &self,
        feature_id: &str,
        facility_id: Option<&str>,
        options: DisableOptions,
    ) -> Result<DisablePlan, FeatureToggleError> {
        let scope = self.scope_for(facility_id)?;
        let definition = self.require_feature(feature_id)?;
        Self::ensure_writable(definition, &scope)?;

        let store = self.store.upgradable_read();
        let resolver = self.resolver();
        let mut blocked_by = resolver.find_dependents(feature_id, &read_scope(&store, &scope));
        let mut facilities = Vec::new();
        if scope == ConfigScope::Global {
            // Facilities that inherit an enabled value lose it too
            for facility_id in store.facility_ids() {
                if !store.inherits(&facility_id, feature_id)
                    || store.effective_value(feature_id, &facility_id) != Some(true)
                {
                    continue;
                }
                let dependents =
                    resolver.find_dependents(feature_id, &store.read_effective(&facility_id));
                if dependents.is_empty() {
                    continue;
                }
                for dependent in dependents {
                    if !blocked_by.contains(&dependent) {
                        blocked_by.push(dependent);
                    }
                }
                facilities.push(facility_id);
            }
        }

        let forced = !blocked_by.is_empty();
        if forced {
            if !options.force {
                return Ok(DisablePlan::Blocked {
                    blocked_by,
                    facilities,
                });
            }
            tracing::warn!(
                feature_id,
                %scope,
                ?blocked_by,
                ?facilities,
                "Force-disabling feature, dependents are left without a required dependency"
            );
        }

        let mut patch = ConfigPatch::default();
        patch.set(feature_id, false);
        match self.commit(store, scope, patch, forced) {
            Commit::Applied(committed) => Ok(DisablePlan::Committed(committed)),
            Commit::Rejected(violations) => {
                let mut blocked_by = Vec::new();
                let mut facilities = Vec::new();
                for violation in violations {
                    if !blocked_by.contains(&violation.feature) {
                        blocked_by.push(violation.feature);
                    }
                    if let Some(facility_id) = violation.facility_id {
                        if !facilities.contains(&facility_id) {
                            facilities.push(facility_id);
                        }
                    }
                }
                Ok(DisablePlan::Blocked {
                    blocked_by,
                    facilities,
                })
            }
        }
    }

    /// Violations left in `scope` once `patch` is applied, plus the ones a
    /// global patch would introduce in inheriting facilities
    fn proposed_violations(
        &self,
        store: &ConfigurationStore,
        scope: &ConfigScope,
        patch: &ConfigPatch,
    ) -> Vec<Violation> {
        let resolver = self.resolver();
        let mut proposed = read_scope(store, scope);
        patch.apply_to(&mut proposed);
        let mut violations = resolver.validate(&proposed);

        if *scope == ConfigScope::Global {
            for facility_id in store.facility_ids() {
                let current = store.read_effective(&facility_id);
                let inherited = store.effective_over(&facility_id, &proposed);
                violations.extend(
                    resolver
                        .introduced_violations(&current, &inherited)
                        .into_iter()
                        .map(|violation| violation.in_facility(facility_id.as_str())),
                );
            }
        }
        violations
    }

    /// Validate (unless `forced`), then upgrade and write.
    ///
    /// A global write re-derives inheritance for every known facility inside
    /// the same critical section.
    fn commit(
        &self,
        store: RwLockUpgradableReadGuard<'_, ConfigurationStore>,
        scope: ConfigScope,
        patch: ConfigPatch,
        forced: bool,
    ) -> Commit {
        if !forced {
            let violations = self.proposed_violations(&store, &scope, &patch);
            if !violations.is_empty() {
                tracing::debug!(%scope, ?violations, "Configuration change rejected");
                return Commit::Rejected(violations);
            }
        }

        let mut store = RwLockUpgradableReadGuard::upgrade(store);
        let (changes, notify) = match &scope {
            ConfigScope::Global => {
                let changes = store.write_global(&patch);
                let mut notify = Vec::new();
                for facility_id in store.facility_ids() {
                    let inherited = store.reapply_inheritance(&facility_id);
                    if changes.iter().any(|c| inherited.contains(&c.feature_id)) {
                        notify.push(facility_id);
                    }
                }
                (changes, notify)
            }
            ConfigScope::Facility(facility_id) => {
                let changes = store.write_facility(facility_id, &patch);
                let notify = if changes.is_empty() {
                    Vec::new()
                } else {
                    vec![facility_id.clone()]
                };
                (changes, notify)
            }
        };

        if forced && scope == ConfigScope::Global {
            let store = RwLockWriteGuard::downgrade(store);
            let resolver = self.resolver();
            for facility_id in &notify {
                let violations = resolver.validate(&store.read_effective(facility_id));
                if !violations.is_empty() {
                    tracing::warn!(
                        facility_id = %facility_id,
                        ?violations,
                        "Facility left with dependency violations after forced global change"
                    );
                }
            }
        }

        tracing::debug!(
            %scope,
            applied = patch.len(),
            changed = changes.len(),
            forced,
            "Configuration change committed"
        );
        Commit::Applied(Committed {
            scope,
            applied: patch.feature_ids(),
            changes,
            notify,
            forced,
        })
    }

    async fn finish(&self, commit: Commit) -> ConfigUpdateOutcome {
        match commit {
            Commit::Rejected(violations) => ConfigUpdateOutcome::Rejected { violations },
            Commit::Applied(committed) => {
                let applied = committed.applied.clone();
                self.publish_changes(committed).await;
                ConfigUpdateOutcome::Applied { applied }
            }
        }
    }

    async fn publish_changes(&self, committed: Committed) {
        if committed.changes.is_empty() {
            return;
        }
        let event =
            FeatureEvent::config_changed(&committed.scope, &committed.changes, committed.forced);
        self.publish(event, committed.notify).await;
    }

    async fn publish(&self, event: FeatureEvent, notify: Vec<String>) {
        if let Err(e) = self.event_publisher.publish_audit(event.clone()).await {
            // Log error but don't fail the operation
            tracing::warn!(error = %e, "Failed to publish audit event");
        }

        if notify.is_empty() {
            return;
        }
        if let Err(e) = self.event_publisher.publish_notification(event, notify).await {
            tracing::warn!(error = %e, "Failed to publish notification event");
        }
    }
}
