//! Record to model mappers
//!
//! Conversions between the on-disk snapshot record and contract models

use crate::contract::ConfigSnapshot;

use super::entity::{SnapshotRecord, SNAPSHOT_VERSION};

impl From<&ConfigSnapshot> for SnapshotRecord {
    fn from(snapshot: &ConfigSnapshot) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: snapshot.exported_at,
            global: snapshot.global.clone(),
            facilities: snapshot.facilities.clone(),
        }
    }
}

impl From<SnapshotRecord> for ConfigSnapshot {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            global: record.global,
            facilities: record.facilities,
            exported_at: record.exported_at,
        }
    }
}
