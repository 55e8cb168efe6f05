//! Storage layer - snapshot records and repositories

pub mod entity;
pub mod mapper;
pub mod repositories;

pub use repositories::JsonFileSnapshotRepository;
