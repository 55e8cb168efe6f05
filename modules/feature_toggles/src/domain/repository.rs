//! Repository traits for data access
//!
//! Snapshots are the only persistence boundary of the module: the store is
//! restored through `import_snapshot` and saved through `export_snapshot`.
//! Implementations are in infra/storage/repositories.rs

use crate::contract::ConfigSnapshot;
use anyhow::Result;
use async_trait::async_trait;

/// Repository for configuration snapshots
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Load the last saved snapshot, `None` when nothing was saved yet
    async fn load(&self) -> Result<Option<ConfigSnapshot>>;

    /// Replace the saved snapshot
    async fn save(&self, snapshot: &ConfigSnapshot) -> Result<()>;
}
