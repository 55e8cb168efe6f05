//! File-backed repository implementations

use crate::contract::ConfigSnapshot;
use crate::domain::repository::SnapshotRepository;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::entity::{SnapshotRecord, SNAPSHOT_VERSION};

// ===== Snapshot Repository =====

/// Stores the snapshot as a pretty-printed JSON document.
///
/// Writes go to a sibling temp file which is then renamed over the target, so
/// a crash never leaves a truncated snapshot behind.
pub struct JsonFileSnapshotRepository {
    path: PathBuf,
}

impl JsonFileSnapshotRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotRepository for JsonFileSnapshotRepository {
    async fn load(&self) -> Result<Option<ConfigSnapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read snapshot {}", self.path.display()))
            }
        };

        let record: SnapshotRecord = serde_json::from_slice(&bytes)
            .with_context(|| format!("invalid snapshot {}", self.path.display()))?;
        if record.version > SNAPSHOT_VERSION {
            bail!(
                "snapshot {} has unsupported version {} (max {})",
                self.path.display(),
                record.version,
                SNAPSHOT_VERSION
            );
        }
        Ok(Some(record.into()))
    }

    async fn save(&self, snapshot: &ConfigSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let record = SnapshotRecord::from(snapshot);
        let json = serde_json::to_vec_pretty(&record)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .with_context(|| format!("failed to write {}", temp.display()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .with_context(|| format!("failed to replace snapshot {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            facilities = snapshot.facilities.len(),
            "Snapshot saved"
        );
        Ok(())
    }
}
