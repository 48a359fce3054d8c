// src/lib.rs
// moddb - Content-addressed store for game mod data
//
// Architecture:
// - Content is shared: identical content from different combinations is one row
// - Identity is computed from marked fields, never assigned
// - Combinations reference content through join tables only
// - Unreferenced content is reclaimed explicitly, in batches

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod identity;

// ============================================================================
// DATA ACCESS & ORCHESTRATION
// ============================================================================

pub mod app;
pub mod repositories;
pub mod services;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    // Combination
    Combination,
    CombinationStatus,
    // Content
    Category,
    ContentEntity,
    ContentKind,
    Item,
    Mode,
    Recipe,
    RecipeIngredient,
    RecipeProduct,
    Technology,
    TechnologyIngredient,
};

// ============================================================================
// PUBLIC API - Identity
// ============================================================================

pub use identity::{compute_id, FieldEntry, FieldValue, Identifiable, Marker};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Configuration & Database
// ============================================================================

pub use config::CatalogConfig;
pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    reclaim_orphans, CategoryRepository, CombinationRepository, CrossReferenceFactory,
    CrossReferenceManager, ItemRepository, RecipeRepository, ReclamationReport, Relation,
    RelationRegistry, SqliteCategoryRepository, SqliteCombinationRepository,
    SqliteItemRepository, SqliteRecipeRepository, SqliteTechnologyRepository,
    SupportsBulkLookup, SupportsOrphanReclamation, TechnologyRepository,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use app::Catalog;
pub use services::{
    CombinationService, ContentBundle, GarbageCollectionReport, ImportSummary,
    ReclamationService,
};
