//! Read-only aggregation over the configuration store

use crate::contract::{
    CategoryStats, ConfigScope, ConfigSnapshot, ConfigSummary, FeatureAnalysis, FeatureCategory,
    FeatureMap, ScopeExport, Violation,
};
use chrono::Utc;
use std::collections::BTreeMap;

use super::registry::FeatureRegistry;
use super::resolver::DependencyResolver;
use super::store::ConfigurationStore;

/// Counts over registered features only; extra keys in `config` are ignored
pub fn summarize(registry: &FeatureRegistry, config: &FeatureMap) -> ConfigSummary {
    let total = registry.len();
    let enabled_count = registry
        .all()
        .iter()
        .filter(|definition| config.get(&definition.id).copied().unwrap_or(false))
        .count();
    let percentage = if total == 0 {
        0.0
    } else {
        (enabled_count as f64 * 1000.0 / total as f64).round() / 10.0
    };

    ConfigSummary {
        total,
        enabled_count,
        disabled_count: total - enabled_count,
        percentage,
    }
}

pub struct AnalysisReporter<'a> {
    registry: &'a FeatureRegistry,
    store: &'a ConfigurationStore,
}

impl<'a> AnalysisReporter<'a> {
    pub fn new(registry: &'a FeatureRegistry, store: &'a ConfigurationStore) -> Self {
        Self { registry, store }
    }

    /// Effective view for a facility, raw global view otherwise
    fn config(&self, facility_id: Option<&str>) -> FeatureMap {
        match facility_id {
            Some(facility_id) => self.store.read_effective(facility_id),
            None => self.store.read_global(),
        }
    }

    pub fn summary(&self, facility_id: Option<&str>) -> ConfigSummary {
        summarize(self.registry, &self.config(facility_id))
    }

    pub fn by_category(
        &self,
        facility_id: Option<&str>,
    ) -> BTreeMap<FeatureCategory, CategoryStats> {
        let config = self.config(facility_id);
        self.registry
            .categories()
            .into_iter()
            .map(|category| {
                let features = self.registry.by_category(category);
                let enabled = features
                    .iter()
                    .filter(|definition| config.get(&definition.id).copied().unwrap_or(false))
                    .count();
                (
                    category,
                    CategoryStats {
                        total: features.len(),
                        enabled,
                    },
                )
            })
            .collect()
    }

    pub fn dependency_issues(&self, facility_id: Option<&str>) -> Vec<Violation> {
        DependencyResolver::new(self.registry).validate(&self.config(facility_id))
    }

    pub fn analysis(&self, facility_id: Option<&str>) -> FeatureAnalysis {
        FeatureAnalysis {
            summary: self.summary(facility_id),
            by_category: self.by_category(facility_id),
            dependency_issues: self.dependency_issues(facility_id),
        }
    }

    pub fn export_snapshot(&self) -> ConfigSnapshot {
        self.store.export()
    }

    pub fn export_scope(&self, scope: &ConfigScope) -> ScopeExport {
        let facility_id = scope.facility_id();
        let stored = match facility_id {
            Some(facility_id) => self.store.read_facility_overrides(facility_id),
            None => self.store.read_global(),
        };
        let effective = self.config(facility_id);
        let facility = facility_id.and_then(|id| self.store.facility(id));
        let (global_revision, updated_at) = match facility {
            Some(facility) => (facility.global_revision, facility.updated_at),
            None => (self.store.global_revision(), None),
        };

        ScopeExport {
            scope: scope.clone(),
            stored,
            summary: summarize(self.registry, &effective),
            effective,
            global_revision,
            updated_at,
            exported_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{FeatureDefinition, FeatureScope};
    use crate::domain::store::ConfigPatch;
    use std::sync::Arc;

    fn feature(id: &str, category: FeatureCategory, deps: &[&str], on: bool) -> FeatureDefinition {
        FeatureDefinition {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            category,
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            default_enabled: on,
            scope: FeatureScope::BOTH,
        }
    }

    fn registry() -> Arc<FeatureRegistry> {
        Arc::new(
            FeatureRegistry::new(vec![
                feature("products", FeatureCategory::Core, &[], true),
                feature("batches", FeatureCategory::Inventory, &["products"], true),
                feature("fifo", FeatureCategory::Inventory, &["batches"], false),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_summarize_counts_and_percentage() {
        let registry = registry();
        let config: FeatureMap = [("products".to_string(), true), ("ghost".to_string(), true)]
            .into_iter()
            .collect();

        let summary = summarize(&registry, &config);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.enabled_count, 1);
        assert_eq!(summary.disabled_count, 2);
        assert_eq!(summary.percentage, 33.3);
    }

    #[test]
    fn test_by_category_and_issues_follow_facility_view() {
        let registry = registry();
        let mut store = ConfigurationStore::seed_global(registry.clone());
        let raw: FeatureMap = [("batches".to_string(), false), ("fifo".to_string(), true)]
            .into_iter()
            .collect();
        store.write_facility("north", &ConfigPatch::parse(&registry, &raw).unwrap());

        let reporter = AnalysisReporter::new(&registry, &store);

        let global = reporter.by_category(None);
        assert_eq!(global[&FeatureCategory::Inventory], CategoryStats { total: 2, enabled: 1 });
        assert!(reporter.dependency_issues(None).is_empty());

        let north = reporter.by_category(Some("north"));
        assert_eq!(north[&FeatureCategory::Inventory], CategoryStats { total: 2, enabled: 1 });
        assert_eq!(
            reporter.dependency_issues(Some("north")),
            vec![Violation::new("fifo", "batches")]
        );
    }

    #[test]
    fn test_export_scope_separates_stored_and_effective() {
        let registry = registry();
        let mut store = ConfigurationStore::seed_global(registry.clone());
        let raw: FeatureMap = [("fifo".to_string(), true)].into_iter().collect();
        store.write_facility("north", &ConfigPatch::parse(&registry, &raw).unwrap());

        let reporter = AnalysisReporter::new(&registry, &store);
        let export = reporter.export_scope(&ConfigScope::Facility("north".into()));

        assert_eq!(export.stored.len(), 1);
        assert_eq!(export.effective.len(), 3);
        assert_eq!(export.summary.enabled_count, 3);
        assert_eq!(export.global_revision, 0);
        assert!(export.updated_at.is_some());

        let global = reporter.export_scope(&ConfigScope::Global);
        assert_eq!(global.stored.len(), 3);
        assert!(global.updated_at.is_none());
    }

    #[test]
    fn test_export_scope_reports_revision_stamps() {
        let registry = registry();
        let mut store = ConfigurationStore::seed_global(registry.clone());
        let raw: FeatureMap = [("fifo".to_string(), true)].into_iter().collect();
        store.write_facility("north", &ConfigPatch::parse(&registry, &raw).unwrap());

        let flipped = !store.global_value("batches").unwrap();
        let raw: FeatureMap = [("batches".to_string(), flipped)].into_iter().collect();
        store.write_global(&ConfigPatch::parse(&registry, &raw).unwrap());

        let north = ConfigScope::Facility("north".into());
        {
            let reporter = AnalysisReporter::new(&registry, &store);
            assert_eq!(reporter.export_scope(&ConfigScope::Global).global_revision, 1);
            assert_eq!(reporter.export_scope(&north).global_revision, 0);
        }

        store.reapply_inheritance("north");
        let reporter = AnalysisReporter::new(&registry, &store);
        assert_eq!(reporter.export_scope(&north).global_revision, 1);
    }
}
