// src/repositories/category_repository.rs

use std::collections::HashSet;
use std::sync::Arc;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use crate::db::{ConnectionPool, PooledConn};
use crate::domain::{Category, ContentKind};
use crate::error::AppResult;
use crate::identity::compute_id;
use crate::repositories::bulk::{
    delete_where_in, placeholders, select_existing_ids, SupportsBulkLookup, LOOKUP_CHUNK_SIZE,
};
use crate::repositories::orphans::{retain_orphans, OrphanQuery, SupportsOrphanReclamation};

/// A category is orphaned once no combination and no recipe points at it.
const ORPHAN_QUERY: OrphanQuery = OrphanQuery {
    table: "categories",
    condition: "NOT EXISTS (SELECT 1 FROM combination_category r WHERE r.category_id = e.id) \
                AND NOT EXISTS (SELECT 1 FROM recipes x WHERE x.category_id = e.id)",
};

pub trait CategoryRepository:
    SupportsOrphanReclamation + SupportsBulkLookup<Category> + Send + Sync
{
    /// Stores the category unless a row with the same identity exists.
    /// Returns true when a new row was written.
    fn persist(&self, category: &Category) -> AppResult<bool>;
    /// `persist` on a connection the caller controls.
    fn persist_in(&self, conn: &Connection, category: &Category) -> AppResult<bool>;
    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Category>>;
    fn list_by_combination(&self, combination_id: Uuid) -> AppResult<Vec<Category>>;
}

pub struct SqliteCategoryRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteCategoryRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
        Ok(Category {
            id: row.get("id")?,
            category_type: row.get("type")?,
            name: row.get("name")?,
        })
    }
}

impl CategoryRepository for SqliteCategoryRepository {
    fn persist(&self, category: &Category) -> AppResult<bool> {
        let conn = self.pool.get()?;
        self.persist_in(&conn, category)
    }

    fn persist_in(&self, conn: &Connection, category: &Category) -> AppResult<bool> {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO categories (id, type, name) VALUES (?1, ?2, ?3)",
            params![compute_id(category), category.category_type, category.name],
        )?;
        Ok(inserted > 0)
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        let conn = self.pool.get()?;
        let category = conn
            .query_row(
                "SELECT id, type, name FROM categories WHERE id = ?1",
                params![id],
                Self::row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    fn list_by_combination(&self, combination_id: Uuid) -> AppResult<Vec<Category>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT e.id, e.type, e.name FROM categories e
             JOIN combination_category r ON r.category_id = e.id
             WHERE r.combination_id = ?1
             ORDER BY e.type, e.name",
        )?;
        let categories = stmt
            .query_map(params![combination_id], Self::row_to_category)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }
}

impl SupportsBulkLookup<Category> for SqliteCategoryRepository {
    fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Category>> {
        let conn = self.pool.get()?;
        let mut categories = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(LOOKUP_CHUNK_SIZE) {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, type, name FROM categories WHERE id IN ({})",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), Self::row_to_category)?;
            for category in rows {
                categories.push(category?);
            }
        }
        Ok(categories)
    }

    fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<HashSet<Uuid>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.pool.get()?;
        select_existing_ids(&conn, "categories", ids)
    }
}

impl SupportsOrphanReclamation for SqliteCategoryRepository {
    fn kind(&self) -> ContentKind {
        ContentKind::Category
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
        let deleted = delete_where_in(&tx, "categories", "id", &ids)?;
        tx.commit()?;
        Ok(deleted)
    }
}
