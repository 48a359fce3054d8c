// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod category;
pub mod combination;
pub mod content;
pub mod item;
pub mod recipe;
pub mod technology;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Shared content
pub use content::{ContentEntity, ContentKind, Mode};

// Combination (dataset)
pub use combination::{validate_combination, Combination, CombinationStatus};

// Content entities
pub use category::{validate_category, Category};
pub use item::{validate_item, Item, ITEM_REFERENCE_FIELDS};
pub use recipe::{validate_recipe, Recipe, RecipeIngredient, RecipeProduct};
pub use technology::{validate_technology, Technology, TechnologyIngredient};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
