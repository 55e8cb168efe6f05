//! Feature registry - immutable catalog of feature definitions
//!
//! Built once at startup. Construction validates the catalog; a registry that
//! exists is guaranteed to have unique ids, known dependencies, non-empty
//! scopes and an acyclic dependency graph.

use crate::contract::{CategoryInfo, FeatureCatalog, FeatureCategory, FeatureDefinition};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::validation::validate_feature_id;

/// Load-time catalog errors. Any of these is fatal for the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid feature id '{id}': {reason}")]
    InvalidFeatureId { id: String, reason: String },

    #[error("Duplicate feature id: {0}")]
    DuplicateFeature(String),

    #[error("Feature '{feature}' depends on unknown feature '{dependency}'")]
    UnknownDependency { feature: String, dependency: String },

    #[error("Feature '{0}' depends on itself")]
    SelfDependency(String),

    #[error("Feature '{feature}' lists dependency '{dependency}' more than once")]
    DuplicateDependency { feature: String, dependency: String },

    #[error("Feature '{0}' has neither system nor facility scope")]
    EmptyScope(String),

    #[error("Dependency cycle: {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    features: Vec<FeatureDefinition>,
    index: HashMap<String, usize>,
    by_category: BTreeMap<FeatureCategory, Vec<usize>>,
}

impl FeatureRegistry {
    /// Validate and index a catalog. Declaration order is kept for `all()`.
    pub fn new(features: Vec<FeatureDefinition>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(features.len());
        for (position, feature) in features.iter().enumerate() {
            validate_feature_id(&feature.id).map_err(|reason| RegistryError::InvalidFeatureId {
                id: feature.id.clone(),
                reason,
            })?;
            if feature.scope.is_empty() {
                return Err(RegistryError::EmptyScope(feature.id.clone()));
            }
            if index.insert(feature.id.clone(), position).is_some() {
                return Err(RegistryError::DuplicateFeature(feature.id.clone()));
            }
        }

        for feature in &features {
            let mut seen = HashSet::new();
            for dependency in &feature.dependencies {
                if *dependency == feature.id {
                    return Err(RegistryError::SelfDependency(feature.id.clone()));
                }
                if !index.contains_key(dependency) {
                    return Err(RegistryError::UnknownDependency {
                        feature: feature.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
                if !seen.insert(dependency.as_str()) {
                    return Err(RegistryError::DuplicateDependency {
                        feature: feature.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        detect_cycles(&features, &index)?;

        let mut by_category: BTreeMap<FeatureCategory, Vec<usize>> = BTreeMap::new();
        for (position, feature) in features.iter().enumerate() {
            by_category.entry(feature.category).or_default().push(position);
        }

        tracing::debug!(features = features.len(), "Feature registry built");
        Ok(Self {
            features,
            index,
            by_category,
        })
    }

    pub fn get(&self, feature_id: &str) -> Option<&FeatureDefinition> {
        self.index.get(feature_id).map(|&i| &self.features[i])
    }

    pub fn contains(&self, feature_id: &str) -> bool {
        self.index.contains_key(feature_id)
    }

    /// All definitions in declaration order
    pub fn all(&self) -> &[FeatureDefinition] {
        &self.features
    }

    /// Definitions of one category; empty for categories with no features
    pub fn by_category(&self, category: FeatureCategory) -> Vec<&FeatureDefinition> {
        self.by_category
            .get(&category)
            .map(|positions| positions.iter().map(|&i| &self.features[i]).collect())
            .unwrap_or_default()
    }

    /// Categories that have at least one feature, in enum order
    pub fn categories(&self) -> Vec<FeatureCategory> {
        self.by_category.keys().copied().collect()
    }

    pub fn category_info(&self) -> Vec<CategoryInfo> {
        self.categories().into_iter().map(|c| *c.info()).collect()
    }

    pub fn catalog(&self) -> FeatureCatalog {
        FeatureCatalog {
            features: self.features.clone(),
            categories: self.category_info(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// DFS-based cycle detection over dependency edges
fn detect_cycles(
    features: &[FeatureDefinition],
    index: &HashMap<String, usize>,
) -> Result<(), RegistryError> {
    let mut marks: Vec<Option<Mark>> = vec![None; features.len()];
    let mut path = Vec::new();

    for start in 0..features.len() {
        if marks[start].is_none() {
            visit(start, features, index, &mut marks, &mut path)?;
        }
    }
    Ok(())
}

fn visit(
    node: usize,
    features: &[FeatureDefinition],
    index: &HashMap<String, usize>,
    marks: &mut [Option<Mark>],
    path: &mut Vec<usize>,
) -> Result<(), RegistryError> {
    marks[node] = Some(Mark::Visiting);
    path.push(node);

    for dependency in &features[node].dependencies {
        let Some(&next) = index.get(dependency) else {
            continue;
        };
        match marks[next] {
            Some(Mark::Done) => {}
            Some(Mark::Visiting) => {
                let start = path.iter().position(|&p| p == next).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|&p| features[p].id.clone())
                    .collect();
                cycle.push(features[next].id.clone());
                return Err(RegistryError::DependencyCycle { path: cycle });
            }
            None => visit(next, features, index, marks, path)?,
        }
    }

    path.pop();
    marks[node] = Some(Mark::Done);
    Ok(())
}
