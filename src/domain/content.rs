// src/domain/content.rs
//
// Shared content
//
// Content entities never receive an id from the caller. Their id is derived
// from their marked fields, so identical content imported by different
// combinations lands on the same row.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::identity::{compute_id, Identifiable};

/// The kinds of shared content a combination can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Category,
    Item,
    Recipe,
    Technology,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Category,
        ContentKind::Item,
        ContentKind::Recipe,
        ContentKind::Technology,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Category => "category",
            ContentKind::Item => "item",
            ContentKind::Recipe => "recipe",
            ContentKind::Technology => "technology",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty mode a recipe or technology belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Normal,
    Expensive,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Expensive => "expensive",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Mode::Normal),
            "expensive" => Ok(Mode::Expensive),
            other => Err(DomainError::InvariantViolation(format!(
                "Unknown mode: {}",
                other
            ))),
        }
    }
}

/// A content entity with a computed identity.
pub trait ContentEntity: Identifiable + Sized {
    const KIND: ContentKind;

    fn id(&self) -> Uuid;

    fn set_id(&mut self, id: Uuid);

    /// Recomputes the id from the current content and stores it.
    fn assign_id(&mut self) -> Uuid {
        let id = compute_id(self);
        self.set_id(id);
        id
    }

    /// Consumes the entity and returns it with its id assigned.
    fn identified(mut self) -> Self {
        self.assign_id();
        self
    }
}
