//! Configuration for feature toggles module

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `FEATURE_TOGGLES_MAX_BULK_ITEMS=50`
pub const ENV_PREFIX: &str = "FEATURE_TOGGLES_";

/// Feature toggles configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// YAML feature catalog; the built-in catalog is used when absent
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// JSON snapshot restored on init; no persistence when absent
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Write the snapshot when the module stops
    #[serde(default = "default_true")]
    pub persist_on_shutdown: bool,

    /// Maximum number of items in one bulk update request
    #[serde(default = "default_max_bulk_items")]
    pub max_bulk_items: usize,

    /// Emit audit and notification events to the `feature_toggles::audit`
    /// and `feature_toggles::notification` tracing targets
    #[serde(default)]
    pub audit_events: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: None,
            snapshot_path: None,
            persist_on_shutdown: true,
            max_bulk_items: default_max_bulk_items(),
            audit_events: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_bulk_items() -> usize {
    100
}

impl Config {
    /// Load from an optional YAML file, then `FEATURE_TOGGLES_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("invalid feature toggles configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.catalog_path.is_none());
        assert!(config.persist_on_shutdown);
        assert_eq!(config.max_bulk_items, 100);
        assert!(!config.audit_events);
    }

    #[test]
    fn test_file_then_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "toggles.yaml",
                "snapshot_path: data/snapshot.json\nmax_bulk_items: 10\n",
            )?;
            jail.set_env("FEATURE_TOGGLES_MAX_BULK_ITEMS", "25");
            jail.set_env("FEATURE_TOGGLES_AUDIT_EVENTS", "true");

            let config = Config::load(Some(Path::new("toggles.yaml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.max_bulk_items, 25);
            assert!(config.audit_events);
            assert_eq!(config.snapshot_path, Some(PathBuf::from("data/snapshot.json")));
            assert!(config.persist_on_shutdown);
            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("toggles.yaml", "max_bulk_itemz: 10\n")?;
            assert!(Config::load(Some(Path::new("toggles.yaml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = Config::load(Some(Path::new("/nonexistent/toggles.yaml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
