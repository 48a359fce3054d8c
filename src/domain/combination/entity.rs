use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult};

/// A versioned bundle of imported mod data.
/// Unlike content, a combination has an assigned (random) identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combination {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Mods making up this combination, sorted and deduplicated
    pub mod_names: Vec<String>,

    pub status: CombinationStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Set once an import completed
    pub imported_at: Option<DateTime<Utc>>,
}

/// Import lifecycle of a combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationStatus {
    Pending,
    Importing,
    Available,
    Errored,
}

impl Combination {
    pub fn new(mut mod_names: Vec<String>) -> Self {
        mod_names.sort();
        mod_names.dedup();
        Self {
            id: Uuid::new_v4(),
            mod_names,
            status: CombinationStatus::Pending,
            created_at: Utc::now(),
            imported_at: None,
        }
    }

    pub fn start_import(&mut self) -> DomainResult<()> {
        match self.status {
            CombinationStatus::Pending | CombinationStatus::Available | CombinationStatus::Errored => {
                self.status = CombinationStatus::Importing;
                Ok(())
            }
            CombinationStatus::Importing => Err(DomainError::InvalidStateTransition(format!(
                "Combination {} is already importing",
                self.id
            ))),
        }
    }

    pub fn finish_import(&mut self) -> DomainResult<()> {
        if self.status != CombinationStatus::Importing {
            return Err(DomainError::InvalidStateTransition(format!(
                "Combination {} is not importing (status: {})",
                self.id, self.status
            )));
        }
        self.status = CombinationStatus::Available;
        self.imported_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail_import(&mut self) {
        self.status = CombinationStatus::Errored;
    }
}

impl fmt::Display for CombinationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombinationStatus::Pending => write!(f, "pending"),
            CombinationStatus::Importing => write!(f, "importing"),
            CombinationStatus::Available => write!(f, "available"),
            CombinationStatus::Errored => write!(f, "errored"),
        }
    }
}

impl FromStr for CombinationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CombinationStatus::Pending),
            "importing" => Ok(CombinationStatus::Importing),
            "available" => Ok(CombinationStatus::Available),
            "errored" => Ok(CombinationStatus::Errored),
            other => Err(DomainError::InvariantViolation(format!(
                "Unknown combination status: {}",
                other
            ))),
        }
    }
}
