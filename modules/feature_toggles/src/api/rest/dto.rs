//! REST DTOs with serde derives for HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ===== Catalog DTOs =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct FeatureScopeDto {
    pub system_level: bool,
    pub facility_level: bool,
}

/// Feature definition response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeatureDefinitionDto {
    #[schema(example = "fifo_tracking")]
    pub id: String,

    #[schema(example = "FIFO Consumption")]
    pub name: String,

    pub description: String,

    /// Category id
    #[schema(example = "inventory")]
    pub category: String,

    /// Features that must be enabled first
    pub dependencies: Vec<String>,

    pub default_enabled: bool,

    pub scope: FeatureScopeDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    #[schema(example = "inventory")]
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Catalog response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogResponse {
    pub features: Vec<FeatureDefinitionDto>,
    pub categories: Vec<CategoryDto>,
}

// ===== Configuration DTOs =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct ConfigSummaryDto {
    pub total: usize,
    pub enabled_count: usize,
    pub disabled_count: usize,
    /// Enabled share in percent, one decimal
    #[schema(example = 62.5)]
    pub percentage: f64,
}

/// Global configuration response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GlobalConfigResponse {
    pub config: BTreeMap<String, bool>,
    pub summary: ConfigSummaryDto,
}

/// Facility configuration response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FacilityConfigResponse {
    #[schema(example = "warehouse-north")]
    pub facility_id: String,

    /// Explicit overrides only
    pub overrides: BTreeMap<String, bool>,

    /// Merged view after inheritance
    pub effective: BTreeMap<String, bool>,

    pub summary: ConfigSummaryDto,
}

/// Partial configuration write; omitted features are left untouched
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateConfigRequest {
    pub features: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ViolationDto {
    /// Enabled feature
    pub feature: String,
    /// Its dependency that is not enabled
    pub missing_dependency: String,
    /// Inheriting facility a global change would break
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,
}

/// Outcome of a validated write; `success = false` is answered with 409
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateOutcomeDto {
    pub success: bool,

    /// Feature ids written, in patch order
    pub applied: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<ViolationDto>,
}

/// Outcome of a disable; `success = false` is answered with 409
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DisableOutcomeDto {
    pub success: bool,

    pub applied: Vec<String>,

    /// Dependency checks were bypassed
    #[serde(default)]
    pub forced: bool,

    /// Enabled dependents that prevented the disable
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,

    /// Inheriting facilities holding those dependents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_facilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetFacilityResponse {
    pub facility_id: String,
    pub removed_overrides: Vec<String>,
}

// ===== Toggle DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToggleEntryDto {
    pub enabled: bool,
    pub definition: FeatureDefinitionDto,
    /// Whether the caller may offer a control for this feature
    pub can_toggle: bool,
    pub dependents: Vec<String>,
    pub missing_dependencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToggleViewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,
    pub toggles: BTreeMap<String, ToggleEntryDto>,
}

/// Single feature check
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeatureStatusDto {
    pub feature_id: String,
    pub enabled: bool,
    pub dependents: Vec<String>,
    pub missing_dependencies: Vec<String>,
}

// ===== Bulk DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkItemDto {
    pub feature_id: String,
    pub enabled: bool,
}

/// Bulk update request; items are applied in order, each on its own
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkUpdateRequest {
    #[serde(default)]
    pub facility_id: Option<String>,
    pub items: Vec<BulkItemDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkItemResultDto {
    pub feature_id: String,
    pub enabled: bool,
    pub success: bool,
    pub applied: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<ViolationDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_facilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkItemErrorDto {
    pub feature_id: String,
    pub status: u16,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkUpdateResponse {
    pub results: Vec<BulkItemResultDto>,
    pub errors: Vec<BulkItemErrorDto>,
}

// ===== Analysis & export DTOs =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct CategoryStatsDto {
    pub total: usize,
    pub enabled: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,
    pub summary: ConfigSummaryDto,
    /// Keyed by category id
    pub by_category: BTreeMap<String, CategoryStatsDto>,
    pub dependency_issues: Vec<ViolationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScopeExportResponse {
    /// `global` or `facility:<id>`
    #[schema(example = "facility:warehouse-north")]
    pub scope: String,
    pub stored: BTreeMap<String, bool>,
    pub effective: BTreeMap<String, bool>,
    pub summary: ConfigSummaryDto,
    /// Global revision the scope reflects
    pub global_revision: u64,
    /// Last facility write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub exported_at: DateTime<Utc>,
}

/// Full backup of both layers; also the import payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SnapshotDto {
    pub global: BTreeMap<String, bool>,
    #[serde(default)]
    pub facilities: BTreeMap<String, BTreeMap<String, bool>>,
    #[serde(default = "Utc::now")]
    pub exported_at: DateTime<Utc>,
}

/// Result of saving the configuration to the snapshot store
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PersistResponse {
    /// `false` when no snapshot store is configured
    pub persisted: bool,
}
