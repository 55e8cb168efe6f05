//! Module declaration and lifecycle implementation

use crate::config::Config;
use crate::contract::FeatureTogglesApi;
use crate::domain::{
    EventPublisher, NoOpEventPublisher, Service, SnapshotRepository, TracingEventPublisher,
};
use crate::infra::catalog::load_registry;
use crate::infra::storage::JsonFileSnapshotRepository;
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Feature toggles module
pub struct FeatureTogglesModule {
    config: RwLock<Config>,
    service: RwLock<Option<Arc<Service>>>,
}

impl Default for FeatureTogglesModule {
    fn default() -> Self {
        Self {
            config: RwLock::new(Config::default()),
            service: RwLock::new(None),
        }
    }
}

impl FeatureTogglesModule {
    /// Load the catalog, build the service and restore the saved snapshot.
    ///
    /// Catalog errors are fatal: the module refuses to start. Events go to
    /// tracing when `audit_events` is set and are dropped otherwise.
    pub async fn init(&self, cfg: Config) -> Result<()> {
        let event_publisher: Arc<dyn EventPublisher> = if cfg.audit_events {
            Arc::new(TracingEventPublisher)
        } else {
            Arc::new(NoOpEventPublisher)
        };
        self.init_with_publisher(cfg, event_publisher).await
    }

    pub async fn init_with_publisher(
        &self,
        cfg: Config,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Result<()> {
        let registry = load_registry(cfg.catalog_path.as_deref())?;
        let mut service = Service::new(Arc::new(registry), event_publisher);

        let mut restored = None;
        if let Some(path) = &cfg.snapshot_path {
            let repo: Arc<dyn SnapshotRepository> =
                Arc::new(JsonFileSnapshotRepository::new(path.clone()));
            restored = repo.load().await?;
            service = service.with_snapshot_repository(repo);
        }

        let service = Arc::new(service);
        if let Some(snapshot) = restored {
            service
                .import_snapshot(snapshot)
                .await
                .context("failed to restore feature configuration snapshot")?;
            tracing::info!(
                facilities = service.list_facilities().len(),
                "Feature configuration restored from snapshot"
            );
        }

        *self.config.write() = cfg;
        *self.service.write() = Some(service);

        tracing::info!("Feature toggles module initialized");
        Ok(())
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn service(&self) -> Result<Arc<Service>> {
        self.service
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// In-process client for other modules
    pub fn client(&self) -> Result<Arc<dyn FeatureTogglesApi>> {
        let client = crate::api::native::NativeClient::new(self.service()?);
        Ok(Arc::new(client))
    }

    /// Mount the REST routes on `router`
    pub fn register_rest(&self, router: axum::Router) -> Result<axum::Router> {
        let service = self.service()?;
        let max_bulk_items = self.config.read().max_bulk_items;

        tracing::info!("Registering feature toggles REST routes");
        crate::api::rest::routes::register_routes(router, service, max_bulk_items)
    }

    /// Save the current configuration; a no-op without a snapshot path
    pub async fn persist(&self) -> Result<()> {
        self.service()?
            .persist_snapshot()
            .await
            .context("failed to persist feature configuration snapshot")?;
        Ok(())
    }

    /// Serve entry point: runs until cancelled, then persists if configured
    pub async fn serve(self: Arc<Self>, cancel: CancellationToken) -> Result<()> {
        cancel.cancelled().await;

        let persist_on_shutdown = self.config.read().persist_on_shutdown;
        if persist_on_shutdown {
            self.persist().await?;
        }
        tracing::info!("Feature toggles module stopped");
        Ok(())
    }
}
