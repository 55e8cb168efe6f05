//! Dependency resolution over the feature registry
//!
//! Pure functions: nothing here reads or writes the configuration store
//! directly, every check runs over a `FeatureMap` snapshot.

use crate::contract::{FeatureMap, Violation};
use std::collections::HashSet;

use super::registry::FeatureRegistry;

#[derive(Clone, Copy)]
pub struct DependencyResolver<'a> {
    registry: &'a FeatureRegistry,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registry: &'a FeatureRegistry) -> Self {
        Self { registry }
    }

    /// The feature plus every transitive dependency, dependencies first.
    ///
    /// The requested feature is always last. Unknown ids yield an empty list.
    ///
    /// # Panics
    /// On a dependency cycle. `FeatureRegistry::new` rejects cyclic catalogs,
    /// so reaching one here means the registry invariant is broken.
    pub fn resolve_closure(&self, feature_id: &str) -> Vec<String> {
        if !self.registry.contains(feature_id) {
            return Vec::new();
        }
        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.visit(feature_id, &mut visiting, &mut visited, &mut order);
        order
    }

    fn visit<'r>(
        &'r self,
        feature_id: &'r str,
        visiting: &mut HashSet<&'r str>,
        visited: &mut HashSet<&'r str>,
        order: &mut Vec<String>,
    ) where
        'a: 'r,
    {
        if visited.contains(feature_id) {
            return;
        }
        if !visiting.insert(feature_id) {
            panic!(
                "dependency cycle through feature '{}': registry invariant violated",
                feature_id
            );
        }
        if let Some(definition) = self.registry.get(feature_id) {
            for dependency in &definition.dependencies {
                self.visit(dependency, visiting, visited, order);
            }
        }
        visiting.remove(feature_id);
        visited.insert(feature_id);
        order.push(feature_id.to_string());
    }

    /// Enabled features in `config` that directly declare `feature_id` as a dependency
    pub fn find_dependents(&self, feature_id: &str, config: &FeatureMap) -> Vec<String> {
        self.registry
            .all()
            .iter()
            .filter(|definition| is_enabled(config, &definition.id))
            .filter(|definition| definition.dependencies.iter().any(|d| d == feature_id))
            .map(|definition| definition.id.clone())
            .collect()
    }

    /// Declared dependencies of `feature_id` that are not enabled in `config`
    pub fn missing_dependencies(&self, feature_id: &str, config: &FeatureMap) -> Vec<String> {
        self.registry
            .get(feature_id)
            .map(|definition| {
                definition
                    .dependencies
                    .iter()
                    .filter(|dependency| !is_enabled(config, dependency))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every enabled feature whose dependency is not enabled, in registry order
    pub fn validate(&self, config: &FeatureMap) -> Vec<Violation> {
        self.registry
            .all()
            .iter()
            .filter(|definition| is_enabled(config, &definition.id))
            .flat_map(|definition| {
                definition
                    .dependencies
                    .iter()
                    .filter(|dependency| !is_enabled(config, dependency))
                    .map(|dependency| Violation::new(&definition.id, dependency))
            })
            .collect()
    }

    /// Violations present in `proposed` that `current` does not already have.
    ///
    /// Used for facilities that inherit a global change: a facility already
    /// broken by its own forced write does not block unrelated global writes.
    pub fn introduced_violations(
        &self,
        current: &FeatureMap,
        proposed: &FeatureMap,
    ) -> Vec<Violation> {
        let existing: HashSet<Violation> = self.validate(current).into_iter().collect();
        self.validate(proposed)
            .into_iter()
            .filter(|violation| !existing.contains(violation))
            .collect()
    }
}

fn is_enabled(config: &FeatureMap, feature_id: &str) -> bool {
    config.get(feature_id).copied().unwrap_or(false)
}
