// src/services/combination_service.rs
//
// Orchestrates combinations and their shared content.
//
// Import order matters: categories and items first, since recipes and
// technologies reference them by id, then the referencing kinds, then the
// associations.
//
// An import runs in one write transaction. It replaces the combination's
// previous associations, so content a re-import dropped becomes orphaned
// and is reclaimed once the transaction has committed.

use std::collections::HashSet;
use std::sync::Arc;

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::{
    validate_category, validate_combination, validate_item, validate_recipe,
    validate_technology, Category, Combination, ContentEntity, Item, Recipe, Technology,
};
use crate::error::{AppError, AppResult};
use crate::repositories::{
    CategoryRepository, CombinationRepository, CrossReferenceFactory, CrossReferenceManager,
    ItemRepository, RecipeRepository, TechnologyRepository,
};
use crate::services::reclamation_service::{GarbageCollectionReport, ReclamationService};

/// Content parsed from one combination's mods.
#[derive(Debug, Clone, Default)]
pub struct ContentBundle {
    pub categories: Vec<Category>,
    pub items: Vec<Item>,
    pub recipes: Vec<Recipe>,
    pub technologies: Vec<Technology>,
}

/// Counts for one content kind of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    /// Distinct identities in the bundle, referenced content included
    pub distinct: usize,
    /// Rows that did not exist before
    pub created: usize,
    /// New combination associations
    pub associated: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub combination_id: Uuid,
    /// Associations from an earlier import that were replaced
    pub released: usize,
    pub categories: KindSummary,
    pub items: KindSummary,
    pub recipes: KindSummary,
    pub technologies: KindSummary,
    /// Reclamation that followed a re-import; `None` when nothing was
    /// released or the pass failed
    pub reclaimed: Option<GarbageCollectionReport>,
}

pub struct CombinationService {
    pool: Arc<ConnectionPool>,
    combination_repo: Arc<dyn CombinationRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    item_repo: Arc<dyn ItemRepository>,
    recipe_repo: Arc<dyn RecipeRepository>,
    technology_repo: Arc<dyn TechnologyRepository>,
    category_refs: CrossReferenceManager,
    item_refs: CrossReferenceManager,
    recipe_refs: CrossReferenceManager,
    technology_refs: CrossReferenceManager,
    reclamation: Arc<ReclamationService>,
}

impl CombinationService {
    /// Fails when the factory has no relation for one of the content kinds.
    pub fn new(
        pool: Arc<ConnectionPool>,
        combination_repo: Arc<dyn CombinationRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        item_repo: Arc<dyn ItemRepository>,
        recipe_repo: Arc<dyn RecipeRepository>,
        technology_repo: Arc<dyn TechnologyRepository>,
        cross_references: &CrossReferenceFactory,
        reclamation: Arc<ReclamationService>,
    ) -> AppResult<Self> {
        Ok(Self {
            pool,
            combination_repo,
            category_repo,
            item_repo,
            recipe_repo,
            technology_repo,
            category_refs: cross_references.for_entity::<Category>()?,
            item_refs: cross_references.for_entity::<Item>()?,
            recipe_refs: cross_references.for_entity::<Recipe>()?,
            technology_refs: cross_references.for_entity::<Technology>()?,
            reclamation,
        })
    }

    pub fn create_combination(&self, mod_names: Vec<String>) -> AppResult<Combination> {
        let combination = Combination::new(mod_names);
        validate_combination(&combination)?;
        self.combination_repo.save(&combination)?;
        log::info!(
            "created combination {} ({})",
            combination.id,
            combination.mod_names.join(", ")
        );
        Ok(combination)
    }

    pub fn get_combination(&self, id: Uuid) -> AppResult<Option<Combination>> {
        self.combination_repo.get_by_id(id)
    }

    pub fn list_combinations(&self) -> AppResult<Vec<Combination>> {
        self.combination_repo.list()
    }

    /// Stores the bundle's content (skipping identities already stored) and
    /// makes it the combination's complete content, replacing what an
    /// earlier import associated.
    pub fn import_content(
        &self,
        combination_id: Uuid,
        bundle: ContentBundle,
    ) -> AppResult<ImportSummary> {
        let mut combination = self
            .combination_repo
            .get_by_id(combination_id)?
            .ok_or(AppError::NotFound)?;

        combination.start_import()?;
        self.combination_repo.save(&combination)?;

        match self.import_bundle(combination_id, bundle) {
            Ok(mut summary) => {
                combination.finish_import()?;
                self.combination_repo.save(&combination)?;
                log::info!(
                    "imported combination {}: {} categories, {} items, {} recipes, {} technologies",
                    combination_id,
                    summary.categories.distinct,
                    summary.items.distinct,
                    summary.recipes.distinct,
                    summary.technologies.distinct
                );

                if summary.released > 0 {
                    summary.reclaimed = match self.reclamation.run() {
                        Ok(report) => Some(report),
                        Err(e) => {
                            log::warn!(
                                "reclamation after re-import of {} failed: {}",
                                combination_id,
                                e
                            );
                            None
                        }
                    };
                }
                Ok(summary)
            }
            Err(e) => {
                log::error!("import of combination {} failed: {}", combination_id, e);
                combination.fail_import();
                if let Err(save_err) = self.combination_repo.save(&combination) {
                    log::error!(
                        "could not mark combination {} as errored: {}",
                        combination_id,
                        save_err
                    );
                }
                Err(e)
            }
        }
    }

    fn import_bundle(&self, combination_id: Uuid, bundle: ContentBundle) -> AppResult<ImportSummary> {
        let ContentBundle {
            categories,
            items,
            recipes,
            technologies,
        } = bundle;

        let referenced_categories = recipes.iter().filter_map(|r| r.category.clone());
        let categories = distinct(categories.into_iter().chain(referenced_categories));

        let referenced_items = recipes
            .iter()
            .flat_map(|r| r.referenced_items().cloned())
            .chain(
                technologies
                    .iter()
                    .flat_map(|t| t.ingredients.iter().map(|i| i.item.clone())),
            )
            .collect::<Vec<_>>();
        let items = distinct(items.into_iter().chain(referenced_items));
        let recipes = distinct(recipes);
        let technologies = distinct(technologies);

        for category in &categories {
            validate_category(category)?;
        }
        for item in &items {
            validate_item(item)?;
        }
        for recipe in &recipes {
            validate_recipe(recipe)?;
        }
        for technology in &technologies {
            validate_technology(technology)?;
        }

        let mut summary = ImportSummary {
            combination_id,
            ..ImportSummary::default()
        };

        // Immediate: take the write lock up front so a concurrent reclamation
        // pass cannot remove rows between persist and associate.
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for refs in self.relations() {
            summary.released += refs.clear_in(&tx, combination_id)?;
        }

        summary.categories = store(&tx, &categories, &self.category_refs, combination_id, |conn, c| {
            self.category_repo.persist_in(conn, c)
        })?;
        summary.items = store(&tx, &items, &self.item_refs, combination_id, |conn, i| {
            self.item_repo.persist_in(conn, i)
        })?;
        summary.recipes = store(&tx, &recipes, &self.recipe_refs, combination_id, |conn, r| {
            self.recipe_repo.persist_in(conn, r)
        })?;
        summary.technologies =
            store(&tx, &technologies, &self.technology_refs, combination_id, |conn, t| {
                self.technology_repo.persist_in(conn, t)
            })?;

        tx.commit()?;
        Ok(summary)
    }

    fn relations(&self) -> [&CrossReferenceManager; 4] {
        [
            &self.category_refs,
            &self.item_refs,
            &self.recipe_refs,
            &self.technology_refs,
        ]
    }

    /// Drops the combination and every association it owned, then reclaims
    /// content no other combination references.
    pub fn delete_combination(&self, id: Uuid) -> AppResult<GarbageCollectionReport> {
        if !self.combination_repo.exists(id)? {
            return Err(AppError::NotFound);
        }

        let mut cleared = 0;
        for refs in self.relations() {
            cleared += refs.clear(id)?;
        }

        self.combination_repo.delete(id)?;
        log::info!("deleted combination {} ({} associations)", id, cleared);

        self.reclamation.run()
    }
}

/// Assigns ids and keeps the first entity of every identity.
fn distinct<E: ContentEntity>(entities: impl IntoIterator<Item = E>) -> Vec<E> {
    let mut seen = HashSet::new();
    entities
        .into_iter()
        .map(ContentEntity::identified)
        .filter(|e| seen.insert(e.id()))
        .collect()
}

/// Persists `entities` and associates them, both on `conn`.
fn store<E, F>(
    conn: &Connection,
    entities: &[E],
    refs: &CrossReferenceManager,
    combination_id: Uuid,
    persist: F,
) -> AppResult<KindSummary>
where
    E: ContentEntity,
    F: Fn(&Connection, &E) -> AppResult<bool>,
{
    let mut created = 0;
    for entity in entities {
        if persist(conn, entity)? {
            created += 1;
        }
    }

    let ids: Vec<Uuid> = entities.iter().map(ContentEntity::id).collect();
    let associated = refs.insert_in(conn, combination_id, &ids)?;

    Ok(KindSummary {
        distinct: entities.len(),
        created,
        associated,
    })
}
