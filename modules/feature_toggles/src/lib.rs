//! Feature Toggles Module
//!
//! Hierarchical feature configuration for a multi-facility inventory system.
//! A static catalog of features with dependencies is configured at two
//! layers: a global layer and sparse per-facility overrides. Every write is
//! validated so that no enabled feature is left without its dependencies.

// Public exports
pub mod contract;
pub use contract::{
    client::FeatureTogglesApi, error::FeatureToggleError, ConfigScope, ConfigSnapshot,
    ConfigUpdateOutcome, DisableOptions, DisableOutcome, EnableOptions, FeatureCategory,
    FeatureDefinition, FeatureMap, FeatureScope, Violation,
};

pub mod config;
pub use config::Config;

pub mod module;
pub use module::FeatureTogglesModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
