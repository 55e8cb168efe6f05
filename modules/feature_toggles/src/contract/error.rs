//! Contract error types for the feature toggles module
//!
//! These errors are transport-agnostic and used for inter-module communication.
//! Dependency violations and blocked disables are outcomes, not errors; see
//! `ConfigUpdateOutcome` and `DisableOutcome`.

/// Feature toggles domain errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureToggleError {
    /// Feature id is not in the registry
    UnknownFeature {
        /// Requested feature id
        feature_id: String,
    },
    /// Feature cannot be overridden per facility
    NotFacilityScoped {
        /// Requested feature id
        feature_id: String,
    },
    /// Facility id is malformed
    InvalidFacilityId {
        /// Offending facility id
        facility_id: String,
        /// Why it was rejected
        reason: String,
    },
    /// Request is malformed
    Validation {
        /// Validation error message
        message: String,
    },
    /// Internal error
    Internal,
}

impl FeatureToggleError {
    pub fn unknown_feature(feature_id: impl Into<String>) -> Self {
        Self::UnknownFeature {
            feature_id: feature_id.into(),
        }
    }
}

impl std::fmt::Display for FeatureToggleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFeature { feature_id } => {
                write!(f, "Unknown feature: {}", feature_id)
            }
            Self::NotFacilityScoped { feature_id } => {
                write!(f, "Feature cannot be configured per facility: {}", feature_id)
            }
            Self::InvalidFacilityId {
                facility_id,
                reason,
            } => {
                write!(f, "Invalid facility id '{}': {}", facility_id, reason)
            }
            Self::Validation { message } => {
                write!(f, "Validation error: {}", message)
            }
            Self::Internal => {
                write!(f, "Internal error")
            }
        }
    }
}

impl std::error::Error for FeatureToggleError {}
