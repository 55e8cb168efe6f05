//! On-disk snapshot record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current snapshot file format
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub global: BTreeMap<String, bool>,
    /// facility id -> explicit overrides
    #[serde(default)]
    pub facilities: BTreeMap<String, BTreeMap<String, bool>>,
}
