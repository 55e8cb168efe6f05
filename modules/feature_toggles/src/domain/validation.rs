//! Identifier validation for facility and feature ids

use crate::contract::FeatureToggleError;

pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Shared identifier rules.
///
/// Accepts alphanumerics plus `_`, `.` and `-`, must start with an
/// alphanumeric character and be at most [`MAX_IDENTIFIER_LEN`] long.
fn check_identifier(id: &str) -> Result<(), String> {
    let Some(first_char) = id.chars().next() else {
        return Err("cannot be empty".to_string());
    };

    if id.len() > MAX_IDENTIFIER_LEN {
        return Err(format!("must be at most {} characters", MAX_IDENTIFIER_LEN));
    }

    if !first_char.is_ascii_alphanumeric() {
        return Err("must start with an alphanumeric character".to_string());
    }

    let is_valid = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-');
    if !is_valid {
        return Err(
            "contains invalid characters. Only alphanumeric, '_', '.', and '-' are allowed"
                .to_string(),
        );
    }

    Ok(())
}

/// Validate a facility (tenant) identifier
pub fn validate_facility_id(facility_id: &str) -> Result<(), FeatureToggleError> {
    check_identifier(facility_id).map_err(|reason| FeatureToggleError::InvalidFacilityId {
        facility_id: facility_id.to_string(),
        reason,
    })
}

/// Validate a feature identifier as declared in a catalog.
///
/// Feature ids are additionally restricted to lowercase.
pub fn validate_feature_id(feature_id: &str) -> Result<(), String> {
    check_identifier(feature_id)?;
    if feature_id.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("must be lowercase".to_string());
    }
    Ok(())
}
