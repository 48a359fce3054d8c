// src/app/mod.rs
//
// Catalog wiring
//
// Builds the pool, schema, repositories and services from one config.

use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::db::{create_connection_pool, initialize_database, ConnectionPool};
use crate::error::AppResult;
use crate::repositories::{
    CategoryRepository, CombinationRepository, CrossReferenceFactory, ItemRepository,
    RecipeRepository, RelationRegistry, SqliteCategoryRepository, SqliteCombinationRepository,
    SqliteItemRepository, SqliteRecipeRepository, SqliteTechnologyRepository,
    TechnologyRepository,
};
use crate::services::{CombinationService, ReclamationService};

/// A ready-to-use catalog.
pub struct Catalog {
    pub pool: Arc<ConnectionPool>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub item_repo: Arc<dyn ItemRepository>,
    pub recipe_repo: Arc<dyn RecipeRepository>,
    pub technology_repo: Arc<dyn TechnologyRepository>,
    pub combination_repo: Arc<dyn CombinationRepository>,
    pub cross_references: Arc<CrossReferenceFactory>,
    pub reclamation: Arc<ReclamationService>,
    pub combinations: Arc<CombinationService>,
}

impl Catalog {
    /// Opens (and if needed creates) the database described by `config`.
    pub fn open(config: &CatalogConfig) -> AppResult<Self> {
        let pool = Arc::new(create_connection_pool(&config.database)?);
        {
            let conn = pool.get()?;
            initialize_database(&conn)?;
        }
        Self::with_pool(pool, config)
    }

    /// Wires everything on top of an initialized pool.
    pub fn with_pool(pool: Arc<ConnectionPool>, config: &CatalogConfig) -> AppResult<Self> {
        let category_repo: Arc<dyn CategoryRepository> =
            Arc::new(SqliteCategoryRepository::new(pool.clone()));
        let item_repo: Arc<dyn ItemRepository> = Arc::new(SqliteItemRepository::new(pool.clone()));
        let recipe_repo: Arc<dyn RecipeRepository> =
            Arc::new(SqliteRecipeRepository::new(pool.clone()));
        let technology_repo: Arc<dyn TechnologyRepository> =
            Arc::new(SqliteTechnologyRepository::new(pool.clone()));
        let combination_repo: Arc<dyn CombinationRepository> =
            Arc::new(SqliteCombinationRepository::new(pool.clone()));

        let cross_references = Arc::new(
            CrossReferenceFactory::new(pool.clone(), RelationRegistry::standard())?
                .with_insert_batch_size(config.storage.insert_batch_size),
        );

        let reclamation = Arc::new(
            ReclamationService::new(
                category_repo.clone(),
                item_repo.clone(),
                recipe_repo.clone(),
                technology_repo.clone(),
            )
            .with_batch_size(config.storage.orphan_batch_size),
        );

        let combinations = Arc::new(CombinationService::new(
            pool.clone(),
            combination_repo.clone(),
            category_repo.clone(),
            item_repo.clone(),
            recipe_repo.clone(),
            technology_repo.clone(),
            &cross_references,
            reclamation.clone(),
        )?);

        log::info!("catalog ready");

        Ok(Self {
            pool,
            category_repo,
            item_repo,
            recipe_repo,
            technology_repo,
            combination_repo,
            cross_references,
            reclamation,
            combinations,
        })
    }
}
