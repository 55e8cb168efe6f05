//! Mapper implementations for converting between DTOs and contract models
//!
//! This module contains all From/Into implementations for bidirectional
//! conversion between REST DTOs and transport-agnostic contract models.

use super::dto::*;
use super::error::map_domain_error;
use crate::contract;

// ===== Catalog conversions =====

impl From<contract::FeatureDefinition> for FeatureDefinitionDto {
    fn from(definition: contract::FeatureDefinition) -> Self {
        Self {
            id: definition.id,
            name: definition.name,
            description: definition.description,
            category: definition.category.id().to_string(),
            dependencies: definition.dependencies,
            default_enabled: definition.default_enabled,
            scope: FeatureScopeDto {
                system_level: definition.scope.system_level,
                facility_level: definition.scope.facility_level,
            },
        }
    }
}

impl From<contract::CategoryInfo> for CategoryDto {
    fn from(info: contract::CategoryInfo) -> Self {
        Self {
            id: info.id.to_string(),
            name: info.name.to_string(),
            description: info.description.to_string(),
        }
    }
}

impl From<contract::FeatureCatalog> for CatalogResponse {
    fn from(catalog: contract::FeatureCatalog) -> Self {
        Self {
            features: catalog.features.into_iter().map(Into::into).collect(),
            categories: catalog.categories.into_iter().map(Into::into).collect(),
        }
    }
}

// ===== Configuration conversions =====

impl From<contract::ConfigSummary> for ConfigSummaryDto {
    fn from(summary: contract::ConfigSummary) -> Self {
        Self {
            total: summary.total,
            enabled_count: summary.enabled_count,
            disabled_count: summary.disabled_count,
            percentage: summary.percentage,
        }
    }
}

impl From<contract::Violation> for ViolationDto {
    fn from(violation: contract::Violation) -> Self {
        Self {
            feature: violation.feature,
            missing_dependency: violation.missing_dependency,
            facility_id: violation.facility_id,
        }
    }
}

impl From<contract::ConfigUpdateOutcome> for UpdateOutcomeDto {
    fn from(outcome: contract::ConfigUpdateOutcome) -> Self {
        match outcome {
            contract::ConfigUpdateOutcome::Applied { applied } => Self {
                success: true,
                applied,
                violations: Vec::new(),
            },
            contract::ConfigUpdateOutcome::Rejected { violations } => Self {
                success: false,
                applied: Vec::new(),
                violations: violations.into_iter().map(Into::into).collect(),
            },
        }
    }
}

impl From<contract::DisableOutcome> for DisableOutcomeDto {
    fn from(outcome: contract::DisableOutcome) -> Self {
        match outcome {
            contract::DisableOutcome::Disabled { applied, forced } => Self {
                success: true,
                applied,
                forced,
                blocked_by: Vec::new(),
                blocked_facilities: Vec::new(),
            },
            contract::DisableOutcome::Blocked {
                blocked_by,
                facilities,
            } => Self {
                success: false,
                applied: Vec::new(),
                forced: false,
                blocked_by,
                blocked_facilities: facilities,
            },
        }
    }
}

// ===== Toggle conversions =====

impl From<contract::ToggleEntry> for ToggleEntryDto {
    fn from(entry: contract::ToggleEntry) -> Self {
        Self {
            enabled: entry.enabled,
            definition: entry.definition.into(),
            can_toggle: entry.can_toggle,
            dependents: entry.dependents,
            missing_dependencies: entry.missing_dependencies,
        }
    }
}

impl From<contract::FeatureStatus> for FeatureStatusDto {
    fn from(status: contract::FeatureStatus) -> Self {
        Self {
            feature_id: status.feature_id,
            enabled: status.enabled,
            dependents: status.dependents,
            missing_dependencies: status.missing_dependencies,
        }
    }
}

// ===== Bulk conversions =====

impl From<BulkItemDto> for contract::BulkItem {
    fn from(item: BulkItemDto) -> Self {
        Self {
            feature_id: item.feature_id,
            enabled: item.enabled,
        }
    }
}

impl From<contract::BulkItemResult> for BulkItemResultDto {
    fn from(result: contract::BulkItemResult) -> Self {
        match result.outcome {
            contract::BulkItemOutcome::Enable(outcome) => {
                let dto = UpdateOutcomeDto::from(outcome);
                Self {
                    feature_id: result.feature_id,
                    enabled: result.enabled,
                    success: dto.success,
                    applied: dto.applied,
                    violations: dto.violations,
                    blocked_by: Vec::new(),
                    blocked_facilities: Vec::new(),
                }
            }
            contract::BulkItemOutcome::Disable(outcome) => {
                let dto = DisableOutcomeDto::from(outcome);
                Self {
                    feature_id: result.feature_id,
                    enabled: result.enabled,
                    success: dto.success,
                    applied: dto.applied,
                    violations: Vec::new(),
                    blocked_by: dto.blocked_by,
                    blocked_facilities: dto.blocked_facilities,
                }
            }
        }
    }
}

impl From<contract::BulkItemError> for BulkItemErrorDto {
    fn from(item: contract::BulkItemError) -> Self {
        let problem = map_domain_error(item.error);
        Self {
            feature_id: item.feature_id,
            status: problem.status,
            detail: problem.detail.unwrap_or(problem.title),
        }
    }
}

impl From<contract::BulkUpdateReport> for BulkUpdateResponse {
    fn from(report: contract::BulkUpdateReport) -> Self {
        Self {
            results: report.results.into_iter().map(Into::into).collect(),
            errors: report.errors.into_iter().map(Into::into).collect(),
        }
    }
}

// ===== Analysis & export conversions =====

impl From<contract::CategoryStats> for CategoryStatsDto {
    fn from(stats: contract::CategoryStats) -> Self {
        Self {
            total: stats.total,
            enabled: stats.enabled,
        }
    }
}

impl From<contract::ScopeExport> for ScopeExportResponse {
    fn from(export: contract::ScopeExport) -> Self {
        Self {
            scope: export.scope.to_string(),
            stored: export.stored,
            effective: export.effective,
            summary: export.summary.into(),
            global_revision: export.global_revision,
            updated_at: export.updated_at,
            exported_at: export.exported_at,
        }
    }
}

impl From<contract::ConfigSnapshot> for SnapshotDto {
    fn from(snapshot: contract::ConfigSnapshot) -> Self {
        Self {
            global: snapshot.global,
            facilities: snapshot.facilities,
            exported_at: snapshot.exported_at,
        }
    }
}

impl From<SnapshotDto> for contract::ConfigSnapshot {
    fn from(dto: SnapshotDto) -> Self {
        Self {
            global: dto.global,
            facilities: dto.facilities,
            exported_at: dto.exported_at,
        }
    }
}
