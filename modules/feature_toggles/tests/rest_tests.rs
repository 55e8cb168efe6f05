//! REST adapter tests driving the axum router in-process

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use feature_toggles::api::rest::routes::register_routes;
use feature_toggles::domain::Service;
use feature_toggles::infra::storage::JsonFileSnapshotRepository;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::{
    print_test_header, test_service, test_service_with_snapshots, FailingSnapshotRepository,
    NORTH,
};

const MAX_BULK_ITEMS: usize = 3;

fn router(service: Arc<Service>) -> Router {
    register_routes(Router::new(), service, MAX_BULK_ITEMS).unwrap()
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_list_definitions() {
    let app = router(test_service());

    let (status, body) = send(&app, Method::GET, "/features/definitions", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["features"].as_array().unwrap().len(), 7);
    assert_eq!(body["features"][1]["id"], "b");
    assert_eq!(body["features"][1]["dependencies"], json!(["a"]));
    assert_eq!(body["features"][5]["scope"]["facility_level"], false);
    assert_eq!(body["categories"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_global_config_write_conflict_then_success() {
    print_test_header(
        "test_global_config_write_conflict_then_success",
        &["A violating patch is answered with 409 and structured violations"],
    );
    let app = router(test_service());

    let (status, body) = send(
        &app,
        Method::PUT,
        "/features/config/global",
        Some(json!({ "features": { "b": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["violations"],
        json!([{ "feature": "b", "missing_dependency": "a" }])
    );

    let (status, body) = send(
        &app,
        Method::PUT,
        "/features/config/global",
        Some(json!({ "features": { "a": true, "b": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], json!(["a", "b"]));

    let (status, body) = send(&app, Method::GET, "/features/config/global", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["b"], true);
    assert_eq!(body["summary"]["enabled_count"], 3);
}

#[tokio::test]
async fn test_enable_and_disable_feature() {
    print_test_header(
        "test_enable_and_disable_feature",
        &["Enable resolves dependencies; disable is blocked unless forced"],
    );
    let app = router(test_service());

    let (status, body) = send(&app, Method::POST, "/features/items/b/enable", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], json!(["a", "b"]));

    let (status, body) = send(&app, Method::POST, "/features/items/a/disable", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["blocked_by"], json!(["b"]));

    let (status, body) =
        send(&app, Method::POST, "/features/items/a/disable?force=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forced"], true);

    let (status, body) = send(&app, Method::GET, "/features/items/b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], true);
    assert_eq!(body["missing_dependencies"], json!(["a"]));

    let (status, body) = send(&app, Method::GET, "/features/analysis", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["dependency_issues"],
        json!([{ "feature": "b", "missing_dependency": "a" }])
    );
}

#[tokio::test]
async fn test_enable_without_auto_dependencies_conflicts() {
    let app = router(test_service());

    let (status, body) = send(
        &app,
        Method::POST,
        "/features/items/d/enable?auto_enable_dependencies=false",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["violations"][0]["missing_dependency"], "e");
}

#[tokio::test]
async fn test_error_statuses() {
    print_test_header(
        "test_error_statuses",
        &["Unknown features map to 404, caller errors to 400"],
    );
    let app = router(test_service());

    let (status, body) = send(&app, Method::GET, "/features/items/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["title"], "Feature Not Found");
    assert_eq!(body["status"], 404);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/features/config/global",
        Some(json!({ "features": { "ghost": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/features/config/facilities/{}", NORTH);
    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "features": { "audit": false } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Feature Not Facility Scoped");

    let (status, body) =
        send(&app, Method::GET, "/features/config/facilities/bad%20id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Invalid Facility Id");
}

#[tokio::test]
async fn test_facility_config_lifecycle() {
    let app = router(test_service());
    let uri = format!("/features/config/facilities/{}", NORTH);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "features": { "c": true, "e": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], json!(["c", "e"]));

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["facility_id"], NORTH);
    assert_eq!(body["overrides"], json!({ "c": true, "e": true }));
    assert_eq!(body["effective"]["audit"], true);
    assert_eq!(body["summary"]["enabled_count"], 3);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/features/toggles?facility_id={}", NORTH),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["toggles"]["audit"]["can_toggle"], false);
    assert_eq!(body["toggles"]["c"]["enabled"], true);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/features/export?scope={}", NORTH),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scope"], format!("facility:{}", NORTH));
    assert_eq!(body["stored"], json!({ "c": true, "e": true }));
    assert_eq!(body["global_revision"], 0);
    assert!(body["updated_at"].is_string());

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed_overrides"], json!(["c", "e"]));
}

#[tokio::test]
async fn test_bulk_update() {
    let app = router(test_service());

    let (status, body) = send(
        &app,
        Method::POST,
        "/features/bulk",
        Some(json!({
            "items": [
                { "feature_id": "b", "enabled": true },
                { "feature_id": "ghost", "enabled": true },
                { "feature_id": "a", "enabled": false }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["success"], true);
    assert_eq!(body["results"][1]["success"], false);
    assert_eq!(body["results"][1]["blocked_by"], json!(["b"]));
    assert_eq!(body["errors"][0]["feature_id"], "ghost");
    assert_eq!(body["errors"][0]["status"], 404);

    let items: Vec<Value> = (0..=MAX_BULK_ITEMS)
        .map(|_| json!({ "feature_id": "c", "enabled": true }))
        .collect();
    let (status, body) = send(
        &app,
        Method::POST,
        "/features/bulk",
        Some(json!({ "items": items })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Validation Error");
}

#[tokio::test]
async fn test_snapshot_export_import() {
    print_test_header(
        "test_snapshot_export_import",
        &["A snapshot taken from one instance restores another"],
    );
    let source = router(test_service());
    send(&source, Method::POST, "/features/items/b/enable", None).await;
    send(
        &source,
        Method::PUT,
        &format!("/features/config/facilities/{}", NORTH),
        Some(json!({ "features": { "c": true } })),
    )
    .await;

    let (status, snapshot) = send(&source, Method::GET, "/features/snapshot", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["facilities"][NORTH], json!({ "c": true }));

    let target = router(test_service());
    let (status, _) =
        send(&target, Method::PUT, "/features/snapshot", Some(snapshot.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, restored) = send(&target, Method::GET, "/features/snapshot", None).await;
    assert_eq!(restored["global"], snapshot["global"]);
    assert_eq!(restored["facilities"], snapshot["facilities"]);
}

#[tokio::test]
async fn test_global_write_conflict_names_facility() {
    print_test_header(
        "test_global_write_conflict_names_facility",
        &["A global change that would break an inheriting facility is a 409"],
    );
    let app = router(test_service());
    send(
        &app,
        Method::PUT,
        "/features/config/global",
        Some(json!({ "features": { "a": true } })),
    )
    .await;
    send(
        &app,
        Method::PUT,
        &format!("/features/config/facilities/{}", NORTH),
        Some(json!({ "features": { "b": true } })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/features/config/global",
        Some(json!({ "features": { "a": false } })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["violations"],
        json!([{ "feature": "b", "missing_dependency": "a", "facility_id": NORTH }])
    );

    let (status, body) = send(&app, Method::POST, "/features/items/a/disable", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["blocked_by"], json!(["b"]));
    assert_eq!(body["blocked_facilities"], json!([NORTH]));
}

#[tokio::test]
async fn test_persist_snapshot_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let repository = Arc::new(JsonFileSnapshotRepository::new(&path));

    let (status, body) = send(
        &router(test_service()),
        Method::POST,
        "/features/snapshot/persist",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["persisted"], false);

    let app = router(test_service_with_snapshots(repository));
    let (status, body) = send(&app, Method::POST, "/features/snapshot/persist", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["persisted"], true);
    assert!(path.exists());
}

#[tokio::test]
async fn test_persist_snapshot_failure_is_500() {
    let app = router(test_service_with_snapshots(Arc::new(FailingSnapshotRepository)));

    let (status, body) = send(&app, Method::POST, "/features/snapshot/persist", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["title"], "Internal Server Error");
    assert_eq!(body["detail"], "An unexpected error occurred");
}
