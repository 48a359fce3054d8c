// src/repositories/technology_repository.rs

use std::collections::HashSet;
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use crate::db::{ConnectionPool, PooledConn};
use crate::domain::{ContentKind, Technology, TechnologyIngredient};
use crate::error::AppResult;
use crate::identity::compute_id;
use crate::repositories::bulk::{delete_where_in, select_existing_ids, SupportsBulkLookup};
use crate::repositories::orphans::{retain_orphans, OrphanQuery, SupportsOrphanReclamation};
use crate::repositories::recipe_repository::{parse_mode, row_to_item};

const ORPHAN_QUERY: OrphanQuery = OrphanQuery {
    table: "technologies",
    condition: "NOT EXISTS (SELECT 1 FROM combination_technology r WHERE r.technology_id = e.id)",
};

const TECHNOLOGY_COLUMNS: &str =
    "id, name, mode, count, count_formula, time, level, max_level, description";

pub trait TechnologyRepository:
    SupportsOrphanReclamation + SupportsBulkLookup<Technology> + Send + Sync
{
    /// Stores the technology and its ingredients unless one with the same
    /// identity exists. Ingredient items must already be stored.
    fn persist(&self, technology: &Technology) -> AppResult<bool>;
    /// `persist` on a connection the caller controls.
    fn persist_in(&self, conn: &Connection, technology: &Technology) -> AppResult<bool>;
    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Technology>>;
    fn list_by_combination(&self, combination_id: Uuid) -> AppResult<Vec<Technology>>;
}

pub struct SqliteTechnologyRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteTechnologyRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn load(conn: &Connection, id: Uuid) -> AppResult<Option<Technology>> {
        let technology = conn
            .query_row(
                &format!("SELECT {} FROM technologies WHERE id = ?1", TECHNOLOGY_COLUMNS),
                params![id],
                Self::row_to_technology,
            )
            .optional()?;

        let Some(mut technology) = technology else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT i.id, i.type, i.name, i.stack_size, ti.amount
             FROM technology_ingredients ti
             JOIN items i ON i.id = ti.item_id
             WHERE ti.technology_id = ?1
             ORDER BY ti.position",
        )?;
        technology.ingredients = stmt
            .query_map(params![id], |row| {
                Ok(TechnologyIngredient {
                    item: row_to_item(row)?,
                    amount: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(technology))
    }

    fn row_to_technology(row: &Row) -> Result<Technology, rusqlite::Error> {
        let mode_str: String = row.get(2)?;
        Ok(Technology {
            id: row.get(0)?,
            name: row.get(1)?,
            mode: parse_mode(2, &mode_str)?,
            count: row.get(3)?,
            count_formula: row.get(4)?,
            time: row.get(5)?,
            level: row.get(6)?,
            max_level: row.get(7)?,
            ingredients: Vec::new(),
            description: row.get(8)?,
        })
    }
}

impl TechnologyRepository for SqliteTechnologyRepository {
    fn persist(&self, technology: &Technology) -> AppResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let inserted = self.persist_in(&tx, technology)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn persist_in(&self, conn: &Connection, technology: &Technology) -> AppResult<bool> {
        let id = compute_id(technology);

        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO technologies ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                TECHNOLOGY_COLUMNS
            ),
            params![
                id,
                technology.name,
                technology.mode.as_str(),
                technology.count,
                technology.count_formula,
                technology.time,
                technology.level,
                technology.max_level,
                technology.description,
            ],
        )?;

        if inserted > 0 {
            let mut stmt = conn.prepare(
                "INSERT INTO technology_ingredients (technology_id, position, item_id, amount)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, ingredient) in technology.ingredients.iter().enumerate() {
                stmt.execute(params![
                    id,
                    position as i64,
                    compute_id(&ingredient.item),
                    ingredient.amount
                ])?;
            }
        }

        Ok(inserted > 0)
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Technology>> {
        let conn = self.pool.get()?;
        Self::load(&conn, id)
    }

    fn list_by_combination(&self, combination_id: Uuid) -> AppResult<Vec<Technology>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT e.id FROM technologies e
             JOIN combination_technology r ON r.technology_id = e.id
             WHERE r.combination_id = ?1
             ORDER BY e.name, e.mode",
        )?;
        let ids = stmt
            .query_map(params![combination_id], |row| row.get::<_, Uuid>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut technologies = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(technology) = Self::load(&conn, id)? {
                technologies.push(technology);
            }
        }
        Ok(technologies)
    }
}

impl SupportsBulkLookup<Technology> for SqliteTechnologyRepository {
    fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Technology>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.pool.get()?;
        let mut technologies = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(technology) = Self::load(&conn, *id)? {
                technologies.push(technology);
            }
        }
        Ok(technologies)
    }

    fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<HashSet<Uuid>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.pool.get()?;
        select_existing_ids(&conn, "technologies", ids)
    }
}

impl SupportsOrphanReclamation for SqliteTechnologyRepository {
    fn kind(&self) -> ContentKind {
        ContentKind::Technology
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
        delete_where_in(&tx, "technology_ingredients", "technology_id", &ids)?;
        let deleted = delete_where_in(&tx, "technologies", "id", &ids)?;
        tx.commit()?;
        Ok(deleted)
    }
}
