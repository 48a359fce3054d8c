// src/domain/category.rs
//
// Category Entity
//
// Crafting categories group recipes and machines. Shared across
// combinations; identity is (type, name).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::content::{ContentEntity, ContentKind};
use crate::domain::{DomainError, DomainResult};
use crate::identity::{FieldEntry, Identifiable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Content-derived identifier
    pub id: Uuid,

    /// Category type, e.g. "crafting" or "resource"
    pub category_type: String,

    pub name: String,
}

impl Category {
    pub fn new(category_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::nil(),
            category_type: category_type.into(),
            name: name.into(),
        }
        .identified()
    }
}

impl Identifiable for Category {
    fn fields(&self) -> Vec<FieldEntry<'_>> {
        vec![
            FieldEntry::marked("type", (&self.category_type).into()),
            FieldEntry::marked("name", (&self.name).into()),
        ]
    }
}

impl ContentEntity for Category {
    const KIND: ContentKind = ContentKind::Category;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// Validates Category invariants
pub fn validate_category(category: &Category) -> DomainResult<()> {
    if category.name.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Category name cannot be empty".to_string(),
        ));
    }
    if category.category_type.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Category type cannot be empty".to_string(),
        ));
    }
    Ok(())
}
