//! Feature catalog loading
//!
//! YAML catalog records are mapped to contract `FeatureDefinition`s and handed
//! to `FeatureRegistry::new`, which performs the load-time validation.

use crate::contract::{FeatureCategory, FeatureDefinition, FeatureScope};
use crate::domain::registry::FeatureRegistry;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Catalog of the inventory application, compiled into the binary
pub const BUILTIN_CATALOG: &str = include_str!("../../../catalog/inventory.yaml");

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub features: Vec<FeatureRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub default_enabled: bool,
    #[serde(default)]
    pub scope: ScopeRecord,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeRecord {
    #[serde(default = "default_true")]
    pub system_level: bool,
    #[serde(default)]
    pub facility_level: bool,
}

impl Default for ScopeRecord {
    fn default() -> Self {
        Self {
            system_level: true,
            facility_level: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl TryFrom<FeatureRecord> for FeatureDefinition {
    type Error = anyhow::Error;

    fn try_from(record: FeatureRecord) -> Result<Self, Self::Error> {
        let category: FeatureCategory = record
            .category
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .with_context(|| format!("feature '{}'", record.id))?;

        Ok(Self {
            id: record.id,
            name: record.name,
            description: record.description,
            category,
            dependencies: record.dependencies,
            default_enabled: record.default_enabled,
            scope: FeatureScope {
                system_level: record.scope.system_level,
                facility_level: record.scope.facility_level,
            },
        })
    }
}

/// Parse a YAML catalog into feature definitions (declaration order kept)
pub fn parse_catalog(yaml: &str) -> Result<Vec<FeatureDefinition>> {
    let file: CatalogFile = serde_yaml::from_str(yaml).context("invalid feature catalog YAML")?;
    file.features
        .into_iter()
        .map(FeatureDefinition::try_from)
        .collect()
}

pub fn builtin_catalog() -> Result<Vec<FeatureDefinition>> {
    parse_catalog(BUILTIN_CATALOG)
}

/// Build the registry from a catalog file, or from the built-in catalog
pub fn load_registry(path: Option<&Path>) -> Result<FeatureRegistry> {
    let definitions = match path {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read feature catalog {}", path.display()))?;
            parse_catalog(&yaml)
                .with_context(|| format!("failed to parse feature catalog {}", path.display()))?
        }
        None => builtin_catalog()?,
    };

    let registry = FeatureRegistry::new(definitions).context("feature catalog rejected")?;
    tracing::info!(
        features = registry.len(),
        categories = registry.categories().len(),
        "Feature registry loaded"
    );
    Ok(registry)
}
