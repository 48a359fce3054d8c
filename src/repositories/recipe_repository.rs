// src/repositories/recipe_repository.rs
//
// Recipes own their ingredient and product rows. Those child rows are
// written together with the recipe and deleted before it.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use crate::db::{ConnectionPool, PooledConn};
use crate::domain::{Category, ContentKind, Item, Mode, Recipe, RecipeIngredient, RecipeProduct};
use crate::error::AppResult;
use crate::identity::compute_id;
use crate::repositories::bulk::{delete_where_in, select_existing_ids, SupportsBulkLookup};
use crate::repositories::orphans::{retain_orphans, OrphanQuery, SupportsOrphanReclamation};

const ORPHAN_QUERY: OrphanQuery = OrphanQuery {
    table: "recipes",
    condition: "NOT EXISTS (SELECT 1 FROM combination_recipe r WHERE r.recipe_id = e.id)",
};

pub trait RecipeRepository: SupportsOrphanReclamation + SupportsBulkLookup<Recipe> + Send + Sync {
    /// Stores the recipe with its ingredients and products unless a recipe
    /// with the same identity exists. Referenced items and the category must
    /// already be stored.
    fn persist(&self, recipe: &Recipe) -> AppResult<bool>;
    /// `persist` on a connection the caller controls, usually inside its
    /// own transaction.
    fn persist_in(&self, conn: &Connection, recipe: &Recipe) -> AppResult<bool>;
    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Recipe>>;
    fn list_by_combination(&self, combination_id: Uuid) -> AppResult<Vec<Recipe>>;
}

pub struct SqliteRecipeRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteRecipeRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn load(conn: &Connection, id: Uuid) -> AppResult<Option<Recipe>> {
        let recipe = conn
            .query_row(
                "SELECT r.id, r.name, r.mode, r.crafting_time, r.description,
                        c.id, c.type, c.name
                 FROM recipes r
                 LEFT JOIN categories c ON c.id = r.category_id
                 WHERE r.id = ?1",
                params![id],
                Self::row_to_recipe,
            )
            .optional()?;

        let Some(mut recipe) = recipe else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT i.id, i.type, i.name, i.stack_size, ri.amount
             FROM recipe_ingredients ri
             JOIN items i ON i.id = ri.item_id
             WHERE ri.recipe_id = ?1
             ORDER BY ri.position",
        )?;
        recipe.ingredients = stmt
            .query_map(params![id], |row| {
                Ok(RecipeIngredient {
                    item: row_to_item(row)?,
                    amount: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT i.id, i.type, i.name, i.stack_size, rp.amount_min, rp.amount_max, rp.probability
             FROM recipe_products rp
             JOIN items i ON i.id = rp.item_id
             WHERE rp.recipe_id = ?1
             ORDER BY rp.position",
        )?;
        recipe.products = stmt
            .query_map(params![id], |row| {
                Ok(RecipeProduct {
                    item: row_to_item(row)?,
                    amount_min: row.get(4)?,
                    amount_max: row.get(5)?,
                    probability: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(recipe))
    }

    fn row_to_recipe(row: &Row) -> Result<Recipe, rusqlite::Error> {
        let mode_str: String = row.get(2)?;
        let category_id: Option<Uuid> = row.get(5)?;
        let category = match category_id {
            Some(id) => Some(Category {
                id,
                category_type: row.get(6)?,
                name: row.get(7)?,
            }),
            None => None,
        };

        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            mode: parse_mode(2, &mode_str)?,
            crafting_time: row.get(3)?,
            category,
            ingredients: Vec::new(),
            products: Vec::new(),
            description: row.get(4)?,
        })
    }
}

/// Maps the first four columns of `row` to an item.
pub(crate) fn row_to_item(row: &Row) -> Result<Item, rusqlite::Error> {
    Ok(Item {
        id: row.get(0)?,
        item_type: row.get(1)?,
        name: row.get(2)?,
        stack_size: row.get(3)?,
    })
}

pub(crate) fn parse_mode(column: usize, value: &str) -> Result<Mode, rusqlite::Error> {
    Mode::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl RecipeRepository for SqliteRecipeRepository {
    fn persist(&self, recipe: &Recipe) -> AppResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let inserted = self.persist_in(&tx, recipe)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn persist_in(&self, conn: &Connection, recipe: &Recipe) -> AppResult<bool> {
        let id = compute_id(recipe);

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO recipes (id, name, mode, crafting_time, category_id, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                recipe.name,
                recipe.mode.as_str(),
                recipe.crafting_time,
                recipe.category.as_ref().map(|c| compute_id(c)),
                recipe.description,
            ],
        )?;

        // An existing recipe with this identity already has identical children.
        if inserted > 0 {
            let mut stmt = conn.prepare(
                "INSERT INTO recipe_ingredients (recipe_id, position, item_id, amount)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, ingredient) in recipe.ingredients.iter().enumerate() {
                stmt.execute(params![
                    id,
                    position as i64,
                    compute_id(&ingredient.item),
                    ingredient.amount
                ])?;
            }

            let mut stmt = conn.prepare(
                "INSERT INTO recipe_products (recipe_id, position, item_id, amount_min, amount_max, probability)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, product) in recipe.products.iter().enumerate() {
                stmt.execute(params![
                    id,
                    position as i64,
                    compute_id(&product.item),
                    product.amount_min,
                    product.amount_max,
                    product.probability
                ])?;
            }
        }

        Ok(inserted > 0)
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Recipe>> {
        let conn = self.pool.get()?;
        Self::load(&conn, id)
    }

    fn list_by_combination(&self, combination_id: Uuid) -> AppResult<Vec<Recipe>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT e.id FROM recipes e
             JOIN combination_recipe r ON r.recipe_id = e.id
             WHERE r.combination_id = ?1
             ORDER BY e.name, e.mode",
        )?;
        let ids = stmt
            .query_map(params![combination_id], |row| row.get::<_, Uuid>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut recipes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(recipe) = Self::load(&conn, id)? {
                recipes.push(recipe);
            }
        }
        Ok(recipes)
    }
}

impl SupportsBulkLookup<Recipe> for SqliteRecipeRepository {
    fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Recipe>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.pool.get()?;
        let mut recipes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(recipe) = Self::load(&conn, *id)? {
                recipes.push(recipe);
            }
        }
        Ok(recipes)
    }

    fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<HashSet<Uuid>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.pool.get()?;
        select_existing_ids(&conn, "recipes", ids)
    }
}

impl SupportsOrphanReclamation for SqliteRecipeRepository {
    fn kind(&self) -> ContentKind {
        ContentKind::Recipe
    }

    fn orphan_query(&self) -> OrphanQuery {
        ORPHAN_QUERY
    }

    fn connection(&self) -> AppResult<PooledConn> {
        Ok(self.pool.get()?)
    }

    fn delete_by_ids(&self, ids: &[Uuid]) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        // One batch may span several statements; it lands or fails as a whole.
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let ids = retain_orphans(&tx, &ORPHAN_QUERY, ids)?;
        delete_where_in(&tx, "recipe_ingredients", "recipe_id", &ids)?;
        delete_where_in(&tx, "recipe_products", "recipe_id", &ids)?;
        let deleted = delete_where_in(&tx, "recipes", "id", &ids)?;
        tx.commit()?;
        Ok(deleted)
    }
}
