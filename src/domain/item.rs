// src/domain/item.rs
//
// Item Entity
//
// Items and fluids referenced by recipes and technologies.
// Identity is (type, name); the stack size is informational.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::content::{ContentEntity, ContentKind};
use crate::domain::{DomainError, DomainResult};
use crate::identity::{FieldEntry, Identifiable};

/// Fields of an item that relations pull into their own identity.
pub const ITEM_REFERENCE_FIELDS: &[&str] = &["type", "name"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Content-derived identifier
    pub id: Uuid,

    /// "item" or "fluid"
    pub item_type: String,

    pub name: String,

    pub stack_size: u32,
}

impl Item {
    pub fn new(item_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::nil(),
            item_type: item_type.into(),
            name: name.into(),
            stack_size: 0,
        }
        .identified()
    }

    pub fn with_stack_size(mut self, stack_size: u32) -> Self {
        self.stack_size = stack_size;
        self
    }
}

impl Identifiable for Item {
    fn fields(&self) -> Vec<FieldEntry<'_>> {
        vec![
            FieldEntry::marked("type", (&self.item_type).into()),
            FieldEntry::marked("name", (&self.name).into()),
            FieldEntry::unmarked("stackSize", self.stack_size.into()),
        ]
    }
}

impl ContentEntity for Item {
    const KIND: ContentKind = ContentKind::Item;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// Validates Item invariants
pub fn validate_item(item: &Item) -> DomainResult<()> {
    if item.name.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Item name cannot be empty".to_string(),
        ));
    }
    match item.item_type.as_str() {
        "item" | "fluid" => Ok(()),
        other => Err(DomainError::InvariantViolation(format!(
            "Unknown item type: {}",
            other
        ))),
    }
}
