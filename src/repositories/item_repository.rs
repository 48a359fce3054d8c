// src/repositories/item_repository.rs

use std::collections::HashSet;
use std::sync::Arc;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use crate::db::{ConnectionPool, PooledConn};
use crate::domain::{ContentKind, Item};
use crate::error::AppResult;
use crate::identity::compute_id;
use crate::repositories::bulk::{
    delete_where_in, placeholders, select_existing_ids, SupportsBulkLookup, LOOKUP_CHUNK_SIZE,
};
use crate::repositories::orphans::{retain_orphans, OrphanQuery, SupportsOrphanReclamation};

/// Items stay alive while a combination, a recipe (either side) or a
/// technology still refers to them.
const ORPHAN_QUERY: OrphanQuery = OrphanQuery {
    table: "items",
    condition: "NOT EXISTS (SELECT 1 FROM combination_item r WHERE r.item_id = e.id) \
                AND NOT EXISTS (SELECT 1 FROM recipe_ingredients ri WHERE ri.item_id = e.id) \
                AND NOT EXISTS (SELECT 1 FROM recipe_products rp WHERE rp.item_id = e.id) \
                AND NOT EXISTS (SELECT 1 FROM technology_ingredients ti WHERE ti.item_id = e.id)",
};

pub trait ItemRepository: SupportsOrphanReclamation + SupportsBulkLookup<Item> + Send + Sync {
    /// Stores the item unless a row with the same identity exists.
    /// Returns true when a new row was written.
    fn persist(&self, item: &Item) -> AppResult<bool>;
    /// `persist` on a connection the caller controls.
    fn persist_in(&self, conn: &Connection, item: &Item) -> AppResult<bool>;
    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Item>>;
    fn list_by_combination(&self, combination_id: Uuid) -> AppResult<Vec<Item>>;
}

pub struct SqliteItemRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteItemRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &Row) -> Result<Item, rusqlite::Error> {
        Ok(Item {
            id: row.get("id")?,
            item_type: row.get("type")?,
            name: row.get("name")?,
            stack_size: row.get("stack_size")?,
        })
    }
}

impl ItemRepository for SqliteItemRepository {
    fn persist(&self, item: &Item) -> AppResult<bool> {
        let conn = self.pool.get()?;
        self.persist_in(&conn, item)
    }

    fn persist_in(&self, conn: &Connection, item: &Item) -> AppResult<bool> {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO items (id, type, name, stack_size) VALUES (?1, ?2, ?3, ?4)",
            params![compute_id(item), item.item_type, item.name, item.stack_size],
        )?;
        Ok(inserted > 0)
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Item>> {
        let conn = self.pool.get()?;
        let item = conn
            .query_row(
                "SELECT id, type, name, stack_size FROM items WHERE id = ?1",
                params![id],
                Self::row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    fn list_by_combination(&self, combination_id: Uuid) -> AppResult<Vec<Item>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT e.id, e.type, e.name, e.stack_size FROM items e
             JOIN combination_item r ON r.item_id = e.id
             WHERE r.combination_id = ?1
             ORDER BY e.type, e.name",
        )?;
        let items = stmt
            .query_map(params![combination_id], Self::row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

impl SupportsBulkLookup<Item> for SqliteItemRepository {
    fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Item>> {
        let conn = self.pool.get()?;
        let mut items = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(LOOKUP_CHUNK_SIZE) {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, type, name, stack_size FROM items WHERE id IN ({})",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), Self::row_to_item)?;
            for item in rows {
                items.push(item?);
            }
        }
        Ok(items)
    }

    fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<HashSet<Uuid>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.pool.get()?;
        select_existing_ids(&conn, "items", ids)
    }
}

impl SupportsOrphanReclamation for SqliteItemRepository {
    fn kind(&self) -> ContentKind {
        ContentKind::Item
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
        let deleted = delete_where_in(&tx, "items", "id", &ids)?;
        tx.commit()?;
        Ok(deleted)
    }
}
