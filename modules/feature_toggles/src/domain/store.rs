//! Configuration store - global and per-facility feature values
//!
//! The store is a plain container: it never validates dependencies and never
//! locks. The toggle service owns it behind a lock and is its only mutator.

use crate::contract::{
    ConfigSnapshot, FeatureChange, FeatureDefinition, FeatureMap, FeatureToggleError,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::registry::FeatureRegistry;

/// A set of `feature id -> enabled` assignments restricted to registered features.
///
/// Keeps insertion order; assigning the same feature twice keeps the last value
/// at the first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    entries: Vec<(String, bool)>,
}

impl ConfigPatch {
    /// Build a patch for the global layer, rejecting unknown features
    pub fn parse(registry: &FeatureRegistry, raw: &FeatureMap) -> Result<Self, FeatureToggleError> {
        let mut patch = Self::default();
        for (feature_id, &enabled) in raw {
            if !registry.contains(feature_id) {
                return Err(FeatureToggleError::unknown_feature(feature_id.as_str()));
            }
            patch.set(feature_id.clone(), enabled);
        }
        Ok(patch)
    }

    /// Build a patch for a facility layer: features must exist and be facility-scoped
    pub fn parse_for_facility(
        registry: &FeatureRegistry,
        raw: &FeatureMap,
    ) -> Result<Self, FeatureToggleError> {
        let patch = Self::parse(registry, raw)?;
        for (feature_id, _) in &patch.entries {
            let facility_level = registry
                .get(feature_id)
                .is_some_and(|definition| definition.scope.facility_level);
            if !facility_level {
                return Err(FeatureToggleError::NotFacilityScoped {
                    feature_id: feature_id.clone(),
                });
            }
        }
        Ok(patch)
    }

    /// Caller guarantees the feature is registered
    pub(crate) fn set(&mut self, feature_id: impl Into<String>, enabled: bool) {
        let feature_id = feature_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == feature_id) {
            Some(entry) => entry.1 = enabled,
            None => self.entries.push((feature_id, enabled)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(id, enabled)| (id.as_str(), *enabled))
    }

    pub fn feature_ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn apply_to(&self, config: &mut FeatureMap) {
        for (feature_id, enabled) in &self.entries {
            config.insert(feature_id.clone(), *enabled);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sparse override layer of one facility
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacilityConfiguration {
    /// Explicit overrides only; an absent key inherits the global value
    pub overrides: FeatureMap,
    /// Global revision this facility's inheritance was last re-derived against
    pub global_revision: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Effective value of one feature given both layers
fn resolve_effective(
    definition: &FeatureDefinition,
    global: &FeatureMap,
    overrides: Option<&FeatureMap>,
) -> bool {
    let global_value = global
        .get(&definition.id)
        .copied()
        .unwrap_or(definition.default_enabled);

    if definition.scope.facility_level {
        overrides
            .and_then(|o| o.get(&definition.id).copied())
            .unwrap_or(global_value)
    } else {
        global_value
    }
}

#[derive(Debug, Clone)]
pub struct ConfigurationStore {
    registry: Arc<FeatureRegistry>,
    global: FeatureMap,
    global_revision: u64,
    facilities: BTreeMap<String, FacilityConfiguration>,
}

impl ConfigurationStore {
    /// One-time initialisation: every registered feature gets its default
    pub fn seed_global(registry: Arc<FeatureRegistry>) -> Self {
        let global = registry
            .all()
            .iter()
            .map(|definition| (definition.id.clone(), definition.default_enabled))
            .collect();
        Self {
            registry,
            global,
            global_revision: 0,
            facilities: BTreeMap::new(),
        }
    }

    /// Copy of the total global mapping
    pub fn read_global(&self) -> FeatureMap {
        self.global.clone()
    }

    pub fn global_value(&self, feature_id: &str) -> Option<bool> {
        self.global.get(feature_id).copied()
    }

    pub fn global_revision(&self) -> u64 {
        self.global_revision
    }

    /// Copy of a facility's explicit overrides (empty for unknown facilities)
    pub fn read_facility_overrides(&self, facility_id: &str) -> FeatureMap {
        self.facilities
            .get(facility_id)
            .map(|facility| facility.overrides.clone())
            .unwrap_or_default()
    }

    pub fn facility(&self, facility_id: &str) -> Option<&FacilityConfiguration> {
        self.facilities.get(facility_id)
    }

    pub fn facility_ids(&self) -> Vec<String> {
        self.facilities.keys().cloned().collect()
    }

    /// Merged view for a facility, computed on every call
    pub fn read_effective(&self, facility_id: &str) -> FeatureMap {
        self.effective_over(facility_id, &self.global)
    }

    /// Merged view for a facility on top of a candidate global mapping
    pub fn effective_over(&self, facility_id: &str, global: &FeatureMap) -> FeatureMap {
        let overrides = self.facilities.get(facility_id).map(|f| &f.overrides);
        self.registry
            .all()
            .iter()
            .map(|definition| {
                (
                    definition.id.clone(),
                    resolve_effective(definition, global, overrides),
                )
            })
            .collect()
    }

    /// Whether the facility takes `feature_id` from the global layer
    pub fn inherits(&self, facility_id: &str, feature_id: &str) -> bool {
        let overridable = self
            .registry
            .get(feature_id)
            .is_some_and(|definition| definition.scope.facility_level);
        let overridden = self
            .facilities
            .get(facility_id)
            .is_some_and(|facility| facility.overrides.contains_key(feature_id));
        !(overridable && overridden)
    }

    pub fn effective_value(&self, feature_id: &str, facility_id: &str) -> Option<bool> {
        let definition = self.registry.get(feature_id)?;
        let overrides = self.facilities.get(facility_id).map(|f| &f.overrides);
        Some(resolve_effective(definition, &self.global, overrides))
    }

    /// Replace the given keys of the global mapping. Returns the value changes.
    pub fn write_global(&mut self, patch: &ConfigPatch) -> Vec<FeatureChange> {
        let mut changes = Vec::new();
        for (feature_id, enabled) in patch.iter() {
            let previous = self.global.insert(feature_id.to_string(), enabled);
            if previous != Some(enabled) {
                changes.push(FeatureChange {
                    feature_id: feature_id.to_string(),
                    previous: previous.unwrap_or(false),
                    current: enabled,
                });
            }
        }
        if !changes.is_empty() {
            self.global_revision += 1;
        }
        changes
    }

    /// Record explicit overrides for a facility, creating it on first write.
    ///
    /// Changes are reported in effective terms: writing an override equal to
    /// the inherited value pins it without changing the effective view.
    pub fn write_facility(&mut self, facility_id: &str, patch: &ConfigPatch) -> Vec<FeatureChange> {
        let before: Vec<bool> = patch
            .iter()
            .map(|(id, _)| self.effective_value(id, facility_id).unwrap_or(false))
            .collect();

        let global_revision = self.global_revision;
        let facility = self
            .facilities
            .entry(facility_id.to_string())
            .or_insert_with(|| FacilityConfiguration {
                global_revision,
                ..FacilityConfiguration::default()
            });
        patch.apply_to(&mut facility.overrides);
        facility.updated_at = Some(Utc::now());

        patch
            .iter()
            .zip(before)
            .filter(|((_, current), previous)| previous != current)
            .map(|((feature_id, current), previous)| FeatureChange {
                feature_id: feature_id.to_string(),
                previous,
                current,
            })
            .collect()
    }

    /// Re-derive a facility's inherited values from the current global layer.
    ///
    /// Explicit overrides of facility-level features are kept; stale keys for
    /// features that cannot be overridden are dropped. Every other feature
    /// follows the global mapping from now on. Returns the inherited feature ids.
    pub fn reapply_inheritance(&mut self, facility_id: &str) -> Vec<String> {
        let registry = &self.registry;
        let global_revision = self.global_revision;
        let Some(facility) = self.facilities.get_mut(facility_id) else {
            return Vec::new();
        };

        facility.overrides.retain(|feature_id, _| {
            registry
                .get(feature_id)
                .is_some_and(|definition| definition.scope.facility_level)
        });
        facility.global_revision = global_revision;

        registry
            .all()
            .iter()
            .filter(|definition| !facility.overrides.contains_key(&definition.id))
            .map(|definition| definition.id.clone())
            .collect()
    }

    /// Drop a facility's overrides. Returns the removed override keys.
    pub fn reset_facility(&mut self, facility_id: &str) -> Vec<String> {
        self.facilities
            .remove(facility_id)
            .map(|facility| facility.overrides.into_keys().collect())
            .unwrap_or_default()
    }

    pub fn export(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            global: self.global.clone(),
            facilities: self
                .facilities
                .iter()
                .map(|(id, facility)| (id.clone(), facility.overrides.clone()))
                .collect(),
            exported_at: Utc::now(),
        }
    }

    /// Replace both layers with a snapshot. No dependency validation.
    ///
    /// The global layer stays total: features missing from the snapshot keep
    /// their catalog default. Keys of unregistered features are dropped and
    /// returned so the caller can report them.
    pub fn import(&mut self, snapshot: ConfigSnapshot) -> Vec<String> {
        let mut dropped = Vec::new();

        let mut global: FeatureMap = self
            .registry
            .all()
            .iter()
            .map(|definition| (definition.id.clone(), definition.default_enabled))
            .collect();
        for (feature_id, enabled) in snapshot.global {
            if self.registry.contains(&feature_id) {
                global.insert(feature_id, enabled);
            } else {
                dropped.push(feature_id);
            }
        }

        self.global = global;
        self.global_revision += 1;
        let global_revision = self.global_revision;
        let now = Utc::now();

        self.facilities = snapshot
            .facilities
            .into_iter()
            .map(|(facility_id, overrides)| {
                let overrides = overrides
                    .into_iter()
                    .filter(|(feature_id, _)| {
                        let known = self.registry.contains(feature_id);
                        if !known {
                            dropped.push(format!("{}/{}", facility_id, feature_id));
                        }
                        known
                    })
                    .collect();
                (
                    facility_id,
                    FacilityConfiguration {
                        overrides,
                        global_revision,
                        updated_at: Some(now),
                    },
                )
            })
            .collect();

        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{FeatureCategory, FeatureScope};

    fn feature(id: &str, default_enabled: bool, scope: FeatureScope) -> FeatureDefinition {
        FeatureDefinition {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            category: FeatureCategory::Core,
            dependencies: Vec::new(),
            default_enabled,
            scope,
        }
    }

    fn store() -> ConfigurationStore {
        let registry = FeatureRegistry::new(vec![
            feature("audit_log", true, FeatureScope::SYSTEM),
            feature("barcode", false, FeatureScope::BOTH),
            feature("alerts", true, FeatureScope::FACILITY),
        ])
        .unwrap();
        ConfigurationStore::seed_global(Arc::new(registry))
    }

    fn patch(store: &ConfigurationStore, pairs: &[(&str, bool)]) -> ConfigPatch {
        let raw: FeatureMap = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        ConfigPatch::parse(&store.registry, &raw).unwrap()
    }

    #[test]
    fn test_seed_global_is_total() {
        let store = store();
        let global = store.read_global();
        assert_eq!(global.len(), 3);
        assert_eq!(global["audit_log"], true);
        assert_eq!(global["barcode"], false);
    }

    #[test]
    fn test_patch_rejects_unknown_and_system_only_features() {
        let store = store();
        let raw: FeatureMap = [("ghost".to_string(), true)].into_iter().collect();
        assert_eq!(
            ConfigPatch::parse(&store.registry, &raw),
            Err(FeatureToggleError::unknown_feature("ghost"))
        );

        let raw: FeatureMap = [("audit_log".to_string(), false)].into_iter().collect();
        assert!(matches!(
            ConfigPatch::parse_for_facility(&store.registry, &raw),
            Err(FeatureToggleError::NotFacilityScoped { .. })
        ));
    }

    #[test]
    fn test_patch_keeps_first_position_and_last_value() {
        let mut patch = ConfigPatch::default();
        patch.set("b", true);
        patch.set("a", true);
        patch.set("b", false);
        assert_eq!(patch.feature_ids(), vec!["b", "a"]);
        assert_eq!(patch.iter().next(), Some(("b", false)));
    }

    #[test]
    fn test_effective_merges_overrides_by_scope() {
        let mut store = store();
        let p = patch(&store, &[("barcode", true), ("alerts", false)]);
        store.write_facility("north", &p);

        let effective = store.read_effective("north");
        assert_eq!(effective["barcode"], true);
        assert_eq!(effective["alerts"], false);
        assert_eq!(effective["audit_log"], true);

        // Facilities without overrides see the global layer
        assert_eq!(store.read_effective("south"), store.read_global());
    }

    #[test]
    fn test_write_global_reports_changes_and_bumps_revision() {
        let mut store = store();
        let changes = store.write_global(&patch(&store, &[("barcode", true), ("audit_log", true)]));
        assert_eq!(
            changes,
            vec![FeatureChange {
                feature_id: "barcode".into(),
                previous: false,
                current: true
            }]
        );
        assert_eq!(store.global_revision(), 1);

        let changes = store.write_global(&patch(&store, &[("barcode", true)]));
        assert!(changes.is_empty());
        assert_eq!(store.global_revision(), 1);
    }

    #[test]
    fn test_write_facility_reports_effective_changes() {
        let mut store = store();
        let patch = patch(&store, &[("barcode", false), ("alerts", false)]);
        let changes = store.write_facility("north", &patch);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].feature_id, "alerts");
        assert_eq!(store.read_facility_overrides("north").len(), 2);
    }

    #[test]
    fn test_reapply_inheritance_keeps_overrides_and_prunes_stale_keys() {
        let mut store = store();
        store.write_facility("north", &patch(&store, &[("barcode", false)]));
        store
            .facilities
            .get_mut("north")
            .unwrap()
            .overrides
            .insert("audit_log".into(), false);

        store.write_global(&patch(&store, &[("barcode", true)]));
        let inherited = store.reapply_inheritance("north");

        assert_eq!(inherited, vec!["audit_log", "alerts"]);
        assert_eq!(store.read_facility_overrides("north").len(), 1);
        assert_eq!(store.effective_value("barcode", "north"), Some(false));
        assert_eq!(store.facility("north").unwrap().global_revision, 1);
    }

    #[test]
    fn test_reset_and_round_trip() {
        let mut store = store();
        store.write_global(&patch(&store, &[("barcode", true)]));
        store.write_facility("north", &patch(&store, &[("alerts", false)]));
        let snapshot = store.export();

        let mut restored = ConfigurationStore::seed_global(store.registry.clone());
        let dropped = restored.import(snapshot.clone());
        assert!(dropped.is_empty());
        assert_eq!(restored.read_global(), store.read_global());
        assert_eq!(
            restored.read_facility_overrides("north"),
            store.read_facility_overrides("north")
        );

        assert_eq!(restored.reset_facility("north"), vec!["alerts"]);
        assert!(restored.facility_ids().is_empty());
        assert!(restored.reset_facility("north").is_empty());
    }

    #[test]
    fn test_import_drops_unregistered_keys() {
        let mut store = store();
        let mut snapshot = store.export();
        snapshot.global.insert("ghost".into(), true);
        snapshot
            .facilities
            .insert("north".into(), [("phantom".to_string(), true)].into_iter().collect());

        let dropped = store.import(snapshot);
        assert_eq!(dropped, vec!["ghost", "north/phantom"]);
        assert!(!store.read_global().contains_key("ghost"));
        assert!(store.read_facility_overrides("north").is_empty());
    }
}
