//! Contract models for the feature toggles module
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Mapping `feature id -> enabled`, ordered by feature id
pub type FeatureMap = BTreeMap<String, bool>;

/// Where a feature has meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureScope {
    /// The feature can be configured at the global (system-wide) layer
    pub system_level: bool,
    /// Individual facilities may override the global value
    pub facility_level: bool,
}

impl FeatureScope {
    pub const SYSTEM: Self = Self {
        system_level: true,
        facility_level: false,
    };
    pub const FACILITY: Self = Self {
        system_level: false,
        facility_level: true,
    };
    pub const BOTH: Self = Self {
        system_level: true,
        facility_level: true,
    };

    /// A scope with neither level set is invalid in a catalog
    pub fn is_empty(&self) -> bool {
        !self.system_level && !self.facility_level
    }
}

/// Display grouping for features
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureCategory {
    Core,
    Inventory,
    Warehouse,
    Purchasing,
    Reporting,
    Integrations,
    Administration,
}

/// Presentational metadata of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    pub category: FeatureCategory,
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

const CATEGORY_INFO: [CategoryInfo; 7] = [
    CategoryInfo {
        category: FeatureCategory::Core,
        id: "core",
        name: "Core",
        description: "Base catalog of products and units",
    },
    CategoryInfo {
        category: FeatureCategory::Inventory,
        id: "inventory",
        name: "Inventory",
        description: "Batch tracking, FIFO consumption and stock alerts",
    },
    CategoryInfo {
        category: FeatureCategory::Warehouse,
        id: "warehouse",
        name: "Warehouse",
        description: "Sections, placement and scanning on the floor",
    },
    CategoryInfo {
        category: FeatureCategory::Purchasing,
        id: "purchasing",
        name: "Purchasing",
        description: "Purchase orders, suppliers and approvals",
    },
    CategoryInfo {
        category: FeatureCategory::Reporting,
        id: "reporting",
        name: "Reporting",
        description: "Dashboards, reports and exports",
    },
    CategoryInfo {
        category: FeatureCategory::Integrations,
        id: "integrations",
        name: "Integrations",
        description: "Connections to external systems",
    },
    CategoryInfo {
        category: FeatureCategory::Administration,
        id: "administration",
        name: "Administration",
        description: "System-wide administrative capabilities",
    },
];

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 7] = [
        FeatureCategory::Core,
        FeatureCategory::Inventory,
        FeatureCategory::Warehouse,
        FeatureCategory::Purchasing,
        FeatureCategory::Reporting,
        FeatureCategory::Integrations,
        FeatureCategory::Administration,
    ];

    pub fn info(self) -> &'static CategoryInfo {
        // CATEGORY_INFO is declared in the same order as the enum
        &CATEGORY_INFO[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.info().id
    }
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FeatureCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATEGORY_INFO
            .iter()
            .find(|info| info.id == s)
            .map(|info| info.category)
            .ok_or_else(|| format!("unknown feature category '{}'", s))
    }
}

/// Immutable definition of a togglable capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDefinition {
    /// Stable unique key
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: FeatureCategory,
    /// Features that must be enabled for this one to be enabled, in declared order
    pub dependencies: Vec<String>,
    /// Seed value for the global configuration
    pub default_enabled: bool,
    pub scope: FeatureScope,
}

/// Full catalog as exposed to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCatalog {
    pub features: Vec<FeatureDefinition>,
    pub categories: Vec<CategoryInfo>,
}

/// Configuration layer an operation targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigScope {
    Global,
    Facility(String),
}

impl ConfigScope {
    pub fn facility_id(&self) -> Option<&str> {
        match self {
            ConfigScope::Global => None,
            ConfigScope::Facility(id) => Some(id),
        }
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigScope::Global => f.write_str("global"),
            ConfigScope::Facility(id) => write!(f, "facility:{}", id),
        }
    }
}

/// An enabled feature whose dependency is not enabled in the same view
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Violation {
    pub feature: String,
    pub missing_dependency: String,
    /// Inheriting facility a global change would break; `None` for the written scope
    pub facility_id: Option<String>,
}

impl Violation {
    pub fn new(feature: impl Into<String>, missing_dependency: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            missing_dependency: missing_dependency.into(),
            facility_id: None,
        }
    }

    pub fn in_facility(mut self, facility_id: impl Into<String>) -> Self {
        self.facility_id = Some(facility_id.into());
        self
    }
}

/// A single committed value change, in effective terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureChange {
    pub feature_id: String,
    pub previous: bool,
    pub current: bool,
}

/// Options for enabling a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableOptions {
    /// Enable the whole dependency closure in one atomic patch
    pub auto_enable_dependencies: bool,
    /// Skip dependency validation. Unsafe: may leave the scope in violation
    pub force: bool,
}

impl Default for EnableOptions {
    fn default() -> Self {
        Self {
            auto_enable_dependencies: true,
            force: false,
        }
    }
}

/// Options for disabling a feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisableOptions {
    /// Disable even when enabled dependents exist. Unsafe: dependents are left in violation
    pub force: bool,
}

/// Result of a validated configuration write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdateOutcome {
    /// The patch was committed; ids in patch order
    Applied { applied: Vec<String> },
    /// Nothing was written
    Rejected { violations: Vec<Violation> },
}

impl ConfigUpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ConfigUpdateOutcome::Applied { .. })
    }

    pub fn applied(&self) -> &[String] {
        match self {
            ConfigUpdateOutcome::Applied { applied } => applied,
            ConfigUpdateOutcome::Rejected { .. } => &[],
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ConfigUpdateOutcome::Applied { .. } => &[],
            ConfigUpdateOutcome::Rejected { violations } => violations,
        }
    }
}

/// Result of a disable request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisableOutcome {
    Disabled { applied: Vec<String>, forced: bool },
    /// Refused because enabled dependents exist; nothing was written.
    ///
    /// `facilities` names inheriting facilities whose dependents block a
    /// global disable.
    Blocked {
        blocked_by: Vec<String>,
        facilities: Vec<String>,
    },
}

impl DisableOutcome {
    pub fn is_disabled(&self) -> bool {
        matches!(self, DisableOutcome::Disabled { .. })
    }

    pub fn blocked_by(&self) -> &[String] {
        match self {
            DisableOutcome::Disabled { .. } => &[],
            DisableOutcome::Blocked { blocked_by, .. } => blocked_by,
        }
    }
}

/// Single-feature check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureStatus {
    pub feature_id: String,
    pub enabled: bool,
    /// Enabled features that list this one as a dependency
    pub dependents: Vec<String>,
    /// Declared dependencies that are not enabled
    pub missing_dependencies: Vec<String>,
}

/// One row of the toggle presentation view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleEntry {
    pub enabled: bool,
    pub definition: FeatureDefinition,
    /// Whether the caller's context may offer a control for this feature
    pub can_toggle: bool,
    pub dependents: Vec<String>,
    pub missing_dependencies: Vec<String>,
}

pub type ToggleView = BTreeMap<String, ToggleEntry>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigSummary {
    pub total: usize,
    pub enabled_count: usize,
    pub disabled_count: usize,
    /// Share of enabled features, 0..=100, one decimal
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub total: usize,
    pub enabled: usize,
}

/// Combined analysis of one configuration view
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAnalysis {
    pub summary: ConfigSummary,
    pub by_category: BTreeMap<FeatureCategory, CategoryStats>,
    pub dependency_issues: Vec<Violation>,
}

/// One requested change in a bulk update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    pub feature_id: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkItemOutcome {
    Enable(ConfigUpdateOutcome),
    Disable(DisableOutcome),
}

impl BulkItemOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            BulkItemOutcome::Enable(outcome) => outcome.is_applied(),
            BulkItemOutcome::Disable(outcome) => outcome.is_disabled(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemResult {
    pub feature_id: String,
    pub enabled: bool,
    pub outcome: BulkItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemError {
    pub feature_id: String,
    pub error: super::error::FeatureToggleError,
}

/// Per-item results of a bulk update, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpdateReport {
    pub results: Vec<BulkItemResult>,
    pub errors: Vec<BulkItemError>,
}

/// Backup of both configuration layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub global: FeatureMap,
    /// Sparse overrides per facility
    pub facilities: BTreeMap<String, FeatureMap>,
    pub exported_at: DateTime<Utc>,
}

/// Export of a single scope
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeExport {
    pub scope: ConfigScope,
    /// Stored values: the total global map, or the facility's sparse overrides
    pub stored: FeatureMap,
    pub effective: FeatureMap,
    pub summary: ConfigSummary,
    /// Global revision the scope reflects (a facility's last re-derivation)
    pub global_revision: u64,
    /// Last facility write; `None` for the global scope
    pub updated_at: Option<DateTime<Utc>>,
    pub exported_at: DateTime<Utc>,
}
