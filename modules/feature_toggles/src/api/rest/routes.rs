//! Route registration

use super::{dto::*, error::Problem, handlers};
use crate::domain::Service;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

/// Upper bound on items accepted by one bulk update request
#[derive(Debug, Clone, Copy)]
pub struct BulkLimit(pub usize);

/// Register all REST routes
pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    max_bulk_items: usize,
) -> anyhow::Result<Router> {
    let router = router
        // Catalog
        .route("/features/definitions", get(get_definitions_handler))
        // Configuration layers
        .route(
            "/features/config/global",
            get(get_global_config_handler).put(update_global_config_handler),
        )
        .route(
            "/features/config/facilities/{facility_id}",
            get(get_facility_config_handler)
                .put(update_facility_config_handler)
                .delete(reset_facility_handler),
        )
        // Single features
        .route("/features/toggles", get(get_toggles_handler))
        .route("/features/items/{feature_id}", get(get_feature_handler))
        .route("/features/items/{feature_id}/enable", post(enable_feature_handler))
        .route("/features/items/{feature_id}/disable", post(disable_feature_handler))
        .route("/features/bulk", post(bulk_update_handler))
        // Analysis & backup
        .route("/features/analysis", get(get_analysis_handler))
        .route("/features/export", get(export_scope_handler))
        .route(
            "/features/snapshot",
            get(get_snapshot_handler).put(import_snapshot_handler),
        )
        .route("/features/snapshot/persist", post(persist_snapshot_handler))
        .layer(Extension(BulkLimit(max_bulk_items)))
        .layer(Extension(service));

    Ok(router)
}

// ===== Handler wrappers that extract service from Extension =====

async fn get_definitions_handler(
    Extension(service): Extension<Arc<Service>>,
) -> Json<CatalogResponse> {
    handlers::get_definitions(service).await
}

async fn get_global_config_handler(
    Extension(service): Extension<Arc<Service>>,
) -> Result<Json<GlobalConfigResponse>, Problem> {
    handlers::get_global_config(service).await
}

async fn update_global_config_handler(
    Extension(service): Extension<Arc<Service>>,
    json: Json<UpdateConfigRequest>,
) -> Result<(StatusCode, Json<UpdateOutcomeDto>), Problem> {
    handlers::update_global_config(service, json).await
}

async fn get_facility_config_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
) -> Result<Json<FacilityConfigResponse>, Problem> {
    handlers::get_facility_config(service, path).await
}

async fn update_facility_config_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
    json: Json<UpdateConfigRequest>,
) -> Result<(StatusCode, Json<UpdateOutcomeDto>), Problem> {
    handlers::update_facility_config(service, path, json).await
}

async fn reset_facility_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
) -> Result<Json<ResetFacilityResponse>, Problem> {
    handlers::reset_facility(service, path).await
}

async fn get_toggles_handler(
    Extension(service): Extension<Arc<Service>>,
    query: Query<handlers::FacilityQuery>,
) -> Result<Json<ToggleViewResponse>, Problem> {
    handlers::get_toggles(service, query).await
}

async fn get_feature_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
    query: Query<handlers::FacilityQuery>,
) -> Result<Json<FeatureStatusDto>, Problem> {
    handlers::get_feature(service, path, query).await
}

async fn enable_feature_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
    query: Query<handlers::EnableQuery>,
) -> Result<(StatusCode, Json<UpdateOutcomeDto>), Problem> {
    handlers::enable_feature(service, path, query).await
}

async fn disable_feature_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<String>,
    query: Query<handlers::DisableQuery>,
) -> Result<(StatusCode, Json<DisableOutcomeDto>), Problem> {
    handlers::disable_feature(service, path, query).await
}

async fn bulk_update_handler(
    Extension(service): Extension<Arc<Service>>,
    Extension(BulkLimit(max_items)): Extension<BulkLimit>,
    json: Json<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateResponse>, Problem> {
    handlers::bulk_update(service, max_items, json).await
}

async fn get_analysis_handler(
    Extension(service): Extension<Arc<Service>>,
    query: Query<handlers::FacilityQuery>,
) -> Result<Json<AnalysisResponse>, Problem> {
    handlers::get_analysis(service, query).await
}

async fn export_scope_handler(
    Extension(service): Extension<Arc<Service>>,
    query: Query<handlers::ExportQuery>,
) -> Result<Json<ScopeExportResponse>, Problem> {
    handlers::export_scope(service, query).await
}

async fn get_snapshot_handler(
    Extension(service): Extension<Arc<Service>>,
) -> Json<SnapshotDto> {
    handlers::get_snapshot(service).await
}

async fn import_snapshot_handler(
    Extension(service): Extension<Arc<Service>>,
    json: Json<SnapshotDto>,
) -> Result<StatusCode, Problem> {
    handlers::import_snapshot(service, json).await
}

async fn persist_snapshot_handler(
    Extension(service): Extension<Arc<Service>>,
) -> Result<Json<PersistResponse>, Problem> {
    handlers::persist_snapshot(service).await
}
