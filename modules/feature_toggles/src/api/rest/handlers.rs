//! HTTP request handlers - thin layer that delegates to domain service

use super::{
    dto::*,
    error::{map_domain_error, Problem},
};
use crate::contract::{BulkItem, ConfigScope, DisableOptions, EnableOptions, FeatureToggleError};
use crate::domain::Service;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameter selecting a facility view; absent means global
#[derive(Debug, Default, Deserialize)]
pub struct FacilityQuery {
    pub facility_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnableQuery {
    pub facility_id: Option<String>,
    #[serde(default = "default_true")]
    pub auto_enable_dependencies: bool,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct DisableQuery {
    pub facility_id: Option<String>,
    #[serde(default)]
    pub force: bool,
}

/// `global` (default) or a facility id
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub scope: Option<String>,
}

fn default_true() -> bool {
    true
}

fn outcome_status(success: bool) -> StatusCode {
    if success {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    }
}

// ===== Catalog & configuration handlers =====

/// List feature definitions and categories
pub async fn get_definitions(service: Arc<Service>) -> Json<CatalogResponse> {
    Json(service.catalog().into())
}

pub async fn get_global_config(
    service: Arc<Service>,
) -> Result<Json<GlobalConfigResponse>, Problem> {
    let summary = service.summary(None).map_err(map_domain_error)?;
    Ok(Json(GlobalConfigResponse {
        config: service.global_config(),
        summary: summary.into(),
    }))
}

/// Write a partial global configuration (409 when it would break dependencies)
pub async fn update_global_config(
    service: Arc<Service>,
    Json(req): Json<UpdateConfigRequest>,
) -> Result<(StatusCode, Json<UpdateOutcomeDto>), Problem> {
    let outcome = service
        .set_global_config(req.features)
        .await
        .map_err(map_domain_error)?;

    let dto = UpdateOutcomeDto::from(outcome);
    Ok((outcome_status(dto.success), Json(dto)))
}

pub async fn get_facility_config(
    service: Arc<Service>,
    Path(facility_id): Path<String>,
) -> Result<Json<FacilityConfigResponse>, Problem> {
    let overrides = service
        .facility_overrides(&facility_id)
        .map_err(map_domain_error)?;
    let effective = service
        .effective_config(&facility_id)
        .map_err(map_domain_error)?;
    let summary = service
        .summary(Some(&facility_id))
        .map_err(map_domain_error)?;

    Ok(Json(FacilityConfigResponse {
        facility_id,
        overrides,
        effective,
        summary: summary.into(),
    }))
}

/// Write facility overrides (409 when they would break dependencies)
pub async fn update_facility_config(
    service: Arc<Service>,
    Path(facility_id): Path<String>,
    Json(req): Json<UpdateConfigRequest>,
) -> Result<(StatusCode, Json<UpdateOutcomeDto>), Problem> {
    let outcome = service
        .set_facility_config(&facility_id, req.features)
        .await
        .map_err(map_domain_error)?;

    let dto = UpdateOutcomeDto::from(outcome);
    Ok((outcome_status(dto.success), Json(dto)))
}

/// Drop all overrides of a facility
pub async fn reset_facility(
    service: Arc<Service>,
    Path(facility_id): Path<String>,
) -> Result<Json<ResetFacilityResponse>, Problem> {
    let removed_overrides = service
        .reset_facility(&facility_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(ResetFacilityResponse {
        facility_id,
        removed_overrides,
    }))
}

// ===== Feature handlers =====

pub async fn get_toggles(
    service: Arc<Service>,
    Query(query): Query<FacilityQuery>,
) -> Result<Json<ToggleViewResponse>, Problem> {
    let view = service
        .toggle_view(query.facility_id.as_deref())
        .map_err(map_domain_error)?;

    Ok(Json(ToggleViewResponse {
        facility_id: query.facility_id,
        toggles: view.into_iter().map(|(id, entry)| (id, entry.into())).collect(),
    }))
}

/// Check a single feature
pub async fn get_feature(
    service: Arc<Service>,
    Path(feature_id): Path<String>,
    Query(query): Query<FacilityQuery>,
) -> Result<Json<FeatureStatusDto>, Problem> {
    let status = service
        .check_feature(&feature_id, query.facility_id.as_deref())
        .map_err(map_domain_error)?
        .ok_or_else(|| map_domain_error(FeatureToggleError::unknown_feature(feature_id)))?;

    Ok(Json(status.into()))
}

pub async fn enable_feature(
    service: Arc<Service>,
    Path(feature_id): Path<String>,
    Query(query): Query<EnableQuery>,
) -> Result<(StatusCode, Json<UpdateOutcomeDto>), Problem> {
    let options = EnableOptions {
        auto_enable_dependencies: query.auto_enable_dependencies,
        force: query.force,
    };
    let outcome = service
        .enable_feature(&feature_id, query.facility_id.as_deref(), options)
        .await
        .map_err(map_domain_error)?;

    let dto = UpdateOutcomeDto::from(outcome);
    Ok((outcome_status(dto.success), Json(dto)))
}

pub async fn disable_feature(
    service: Arc<Service>,
    Path(feature_id): Path<String>,
    Query(query): Query<DisableQuery>,
) -> Result<(StatusCode, Json<DisableOutcomeDto>), Problem> {
    let options = DisableOptions { force: query.force };
    let outcome = service
        .disable_feature(&feature_id, query.facility_id.as_deref(), options)
        .await
        .map_err(map_domain_error)?;

    let dto = DisableOutcomeDto::from(outcome);
    Ok((outcome_status(dto.success), Json(dto)))
}

/// Apply several enable/disable requests in order
pub async fn bulk_update(
    service: Arc<Service>,
    max_items: usize,
    Json(req): Json<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateResponse>, Problem> {
    if req.items.len() > max_items {
        return Err(map_domain_error(FeatureToggleError::Validation {
            message: format!(
                "bulk update accepts at most {} items, got {}",
                max_items,
                req.items.len()
            ),
        }));
    }

    let items: Vec<BulkItem> = req.items.into_iter().map(Into::into).collect();
    let report = service
        .bulk_update(items, req.facility_id.as_deref())
        .await
        .map_err(map_domain_error)?;

    Ok(Json(report.into()))
}

// ===== Analysis & export handlers =====

pub async fn get_analysis(
    service: Arc<Service>,
    Query(query): Query<FacilityQuery>,
) -> Result<Json<AnalysisResponse>, Problem> {
    let analysis = service
        .analysis(query.facility_id.as_deref())
        .map_err(map_domain_error)?;

    Ok(Json(AnalysisResponse {
        facility_id: query.facility_id,
        summary: analysis.summary.into(),
        by_category: analysis
            .by_category
            .into_iter()
            .map(|(category, stats)| (category.id().to_string(), stats.into()))
            .collect(),
        dependency_issues: analysis
            .dependency_issues
            .into_iter()
            .map(Into::into)
            .collect(),
    }))
}

pub async fn export_scope(
    service: Arc<Service>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<ScopeExportResponse>, Problem> {
    let scope = match query.scope.as_deref() {
        None | Some("global") => ConfigScope::Global,
        Some(facility_id) => ConfigScope::Facility(facility_id.to_string()),
    };
    let export = service.export_scope(&scope).map_err(map_domain_error)?;

    Ok(Json(export.into()))
}

/// Full backup of both layers
pub async fn get_snapshot(service: Arc<Service>) -> Json<SnapshotDto> {
    Json(service.export_snapshot().into())
}

/// Replace both layers from a backup. Trusted input only: no dependency validation.
pub async fn import_snapshot(
    service: Arc<Service>,
    Json(snapshot): Json<SnapshotDto>,
) -> Result<StatusCode, Problem> {
    service
        .import_snapshot(snapshot.into())
        .await
        .map_err(map_domain_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Save both layers to the configured snapshot store
pub async fn persist_snapshot(service: Arc<Service>) -> Result<Json<PersistResponse>, Problem> {
    let persisted = service
        .persist_snapshot()
        .await
        .map_err(map_domain_error)?;

    Ok(Json(PersistResponse { persisted }))
}
