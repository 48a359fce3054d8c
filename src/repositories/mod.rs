// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO cross-repository calls
// - Explicit SQL only
// - Content rows are written insert-if-absent, keyed by identity

pub mod bulk;
pub mod category_repository;
pub mod combination_repository;
pub mod cross_reference;
pub mod item_repository;
pub mod orphans;
pub mod recipe_repository;
pub mod technology_repository;

pub use bulk::{SupportsBulkLookup, LOOKUP_CHUNK_SIZE};
pub use category_repository::{CategoryRepository, SqliteCategoryRepository};
pub use combination_repository::{CombinationRepository, SqliteCombinationRepository};
pub use cross_reference::{CrossReferenceFactory, CrossReferenceManager, Relation, RelationRegistry};
pub use item_repository::{ItemRepository, SqliteItemRepository};
pub use orphans::{
    reclaim_orphans, BatchFailure, OrphanQuery, ReclamationReport, SupportsOrphanReclamation,
};
pub use recipe_repository::{RecipeRepository, SqliteRecipeRepository};
pub use technology_repository::{SqliteTechnologyRepository, TechnologyRepository};
