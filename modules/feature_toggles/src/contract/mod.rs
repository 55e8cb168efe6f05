//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::FeatureTogglesApi;
pub use error::FeatureToggleError;
pub use model::{
    BulkItem, BulkItemError, BulkItemOutcome, BulkItemResult, BulkUpdateReport, CategoryInfo,
    CategoryStats, ConfigScope, ConfigSnapshot, ConfigSummary, ConfigUpdateOutcome,
    DisableOptions, DisableOutcome, EnableOptions, FeatureAnalysis, FeatureCatalog,
    FeatureCategory, FeatureChange, FeatureDefinition, FeatureMap, FeatureScope, FeatureStatus,
    ScopeExport, ToggleEntry, ToggleView, Violation,
};
