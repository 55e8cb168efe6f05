//! Infrastructure layer - catalog loading and snapshot storage

pub mod catalog;
pub mod storage;
