// src/repositories/bulk.rs
//
// Set-at-a-time statement helpers shared by the content repositories.
//
// Every helper treats an empty id list as a no-op and issues no statement.

use std::collections::HashSet;

use rusqlite::{params_from_iter, Connection};
use uuid::Uuid;

use crate::error::AppResult;

/// Ids bound per `IN (...)` statement.
pub const LOOKUP_CHUNK_SIZE: usize = 500;

/// Repositories that can load many rows by id at once.
pub trait SupportsBulkLookup<E> {
    /// Loads the rows for `ids` that exist; missing ids are skipped.
    fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<E>>;

    /// The subset of `ids` already stored.
    fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<HashSet<Uuid>>;
}

/// `?, ?, ?` with `count` placeholders.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Returns the subset of `ids` present in `table.id`.
pub fn select_existing_ids(
    conn: &Connection,
    table: &str,
    ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    let mut existing = HashSet::new();

    for chunk in ids.chunks(LOOKUP_CHUNK_SIZE) {
        let sql = format!(
            "SELECT id FROM {} WHERE id IN ({})",
            table,
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| row.get::<_, Uuid>(0))?;
        for id in rows {
            existing.insert(id?);
        }
    }

    Ok(existing)
}

/// Deletes every row of `table` whose `column` is in `ids`.
/// Returns the number of rows removed.
pub fn delete_where_in(
    conn: &Connection,
    table: &str,
    column: &str,
    ids: &[Uuid],
) -> AppResult<usize> {
    let mut deleted = 0;

    for chunk in ids.chunks(LOOKUP_CHUNK_SIZE) {
        let sql = format!(
            "DELETE FROM {} WHERE {} IN ({})",
            table,
            column,
            placeholders(chunk.len())
        );
        deleted += conn.execute(&sql, params_from_iter(chunk.iter()))?;
    }

    Ok(deleted)
}
