// src/repositories/orphans.rs
//
// Orphan reclamation
//
// Content rows are shared between combinations and are never deleted along
// with one combination. Instead each content repository says what
// "no longer referenced" means for its rows, and `reclaim_orphans` removes
// them in bounded batches.
//
// RULES:
// - Detection runs once, up front, against a stable snapshot
// - Batches are independent: one failing batch does not stop the others
// - Owned child rows are removed by the repository inside each batch
// - A batch deletes only ids that still match the orphan condition under the
//   write lock, so rows re-referenced since detection survive
// - No candidates, no delete statements

use std::collections::HashSet;

use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use uuid::Uuid;

use crate::db::PooledConn;
use crate::domain::ContentKind;
use crate::error::AppResult;
use crate::repositories::bulk::{placeholders, LOOKUP_CHUNK_SIZE};

/// Where a repository's content lives and how to recognise its orphans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrphanQuery {
    pub table: &'static str,
    /// SQL predicate over the content row aliased as `e`; true when nothing
    /// references the row anymore.
    pub condition: &'static str,
}

impl OrphanQuery {
    pub fn sql(&self) -> String {
        format!("SELECT e.id FROM {} e WHERE {}", self.table, self.condition)
    }

    /// The orphan query restricted to `count` bound ids.
    fn sql_for_ids(&self, count: usize) -> String {
        format!(
            "SELECT e.id FROM {} e WHERE e.id IN ({}) AND ({})",
            self.table,
            placeholders(count),
            self.condition
        )
    }
}

/// Content repositories that take part in orphan reclamation.
#[cfg_attr(test, mockall::automock)]
pub trait SupportsOrphanReclamation: Send + Sync {
    fn kind(&self) -> ContentKind;

    fn orphan_query(&self) -> OrphanQuery;

    /// Connection the detection query runs on.
    fn connection(&self) -> AppResult<PooledConn>;

    /// Ids of every row currently matching `orphan_query`.
    fn find_orphan_ids(&self) -> AppResult<Vec<Uuid>> {
        let conn = self.connection()?;
        select_orphan_ids(&conn, &self.orphan_query())
    }

    /// Deletes the given rows (children first). Returns rows deleted from
    /// the content table itself.
    fn delete_by_ids(&self, ids: &[Uuid]) -> AppResult<usize>;
}

/// Runs an orphan query on `conn`.
pub fn select_orphan_ids(conn: &Connection, query: &OrphanQuery) -> AppResult<Vec<Uuid>> {
    let mut stmt = conn.prepare(&query.sql())?;
    let ids = stmt
        .query_map([], |row| row.get::<_, Uuid>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// The ids that still match `query` on `conn`, in their original order.
///
/// Run it in the transaction that deletes the batch.
pub fn retain_orphans(
    conn: &Connection,
    query: &OrphanQuery,
    ids: &[Uuid],
) -> AppResult<Vec<Uuid>> {
    let mut orphans = HashSet::with_capacity(ids.len());
    for chunk in ids.chunks(LOOKUP_CHUNK_SIZE) {
        let mut stmt = conn.prepare(&query.sql_for_ids(chunk.len()))?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| row.get::<_, Uuid>(0))?;
        for id in rows {
            orphans.insert(id?);
        }
    }
    Ok(ids.iter().copied().filter(|id| orphans.contains(id)).collect())
}

/// A batch whose delete failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Zero-based batch index
    pub batch: usize,
    pub size: usize,
    pub error: String,
}

/// Outcome of one reclamation pass over one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReclamationReport {
    pub kind: ContentKind,
    pub candidates: usize,
    pub batches: usize,
    pub deleted: usize,
    pub failures: Vec<BatchFailure>,
}

impl ReclamationReport {
    fn new(kind: ContentKind, candidates: usize) -> Self {
        Self {
            kind,
            candidates,
            batches: 0,
            deleted: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Finds every orphan of `repository` and deletes them `batch_size` at a time.
///
/// A detection failure is returned as an error. Delete failures are logged,
/// recorded in the report, and do not stop later batches.
pub fn reclaim_orphans<R>(repository: &R, batch_size: usize) -> AppResult<ReclamationReport>
where
    R: SupportsOrphanReclamation + ?Sized,
{
    let kind = repository.kind();
    let batch_size = batch_size.max(1);
    let candidates = repository.find_orphan_ids()?;
    let mut report = ReclamationReport::new(kind, candidates.len());

    if candidates.is_empty() {
        log::debug!("no orphaned {} rows", kind);
        return Ok(report);
    }

    for (index, batch) in candidates.chunks(batch_size).enumerate() {
        report.batches += 1;
        match repository.delete_by_ids(batch) {
            Ok(deleted) => report.deleted += deleted,
            Err(e) => {
                log::warn!(
                    "failed to delete orphaned {} batch {} ({} ids): {}",
                    kind,
                    index,
                    batch.len(),
                    e
                );
                report.failures.push(BatchFailure {
                    batch: index,
                    size: batch.len(),
                    error: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "reclaimed {} of {} orphaned {} rows in {} batches",
        report.deleted,
        report.candidates,
        kind,
        report.batches
    );

    Ok(report)
}
