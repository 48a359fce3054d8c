// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod combination_service;
pub mod reclamation_service;

pub use combination_service::{CombinationService, ContentBundle, ImportSummary, KindSummary};
pub use reclamation_service::{GarbageCollectionReport, ReclamationService};
