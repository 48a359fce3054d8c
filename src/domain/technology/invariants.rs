use super::entity::Technology;
use crate::domain::{DomainError, DomainResult};

/// Validates all Technology invariants
pub fn validate_technology(technology: &Technology) -> DomainResult<()> {
    if technology.name.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Technology name cannot be empty".to_string(),
        ));
    }

    if !technology.time.is_finite() || technology.time < 0.0 {
        return Err(DomainError::InvariantViolation(format!(
            "Invalid research time: {}",
            technology.time
        )));
    }

    if technology.count < 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Research count {} cannot be negative",
            technology.count
        )));
    }

    if technology.level > technology.max_level {
        return Err(DomainError::InvariantViolation(format!(
            "Level {} exceeds max level {}",
            technology.level, technology.max_level
        )));
    }

    Ok(())
}
