//! Critical Combination Invariants:
//!
//! 1. A combination owns associations, never content rows
//! 2. Content may be referenced by any number of combinations
//! 3. Deleting a combination clears its associations only
//! 4. A combination names at least one mod

pub mod entity;

pub use entity::{Combination, CombinationStatus};

use crate::domain::{DomainError, DomainResult};

/// Validates Combination invariants
pub fn validate_combination(combination: &Combination) -> DomainResult<()> {
    if combination.mod_names.is_empty() {
        return Err(DomainError::InvariantViolation(
            "Combination must contain at least one mod".to_string(),
        ));
    }
    if combination.mod_names.iter().any(|name| name.trim().is_empty()) {
        return Err(DomainError::InvariantViolation(
            "Mod names cannot be empty".to_string(),
        ));
    }
    Ok(())
}
