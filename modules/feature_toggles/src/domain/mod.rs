//! Domain layer - business logic and services

pub mod analysis;
pub mod events;
pub mod registry;
pub mod repository;
pub mod resolver;
pub mod service;
pub mod store;
pub mod validation;

pub use analysis::{summarize, AnalysisReporter};
pub use events::{EventPublisher, FeatureEvent, NoOpEventPublisher, TracingEventPublisher};
pub use registry::{FeatureRegistry, RegistryError};
pub use repository::SnapshotRepository;
pub use resolver::DependencyResolver;
pub use service::Service;
pub use store::{ConfigPatch, ConfigurationStore, FacilityConfiguration};
