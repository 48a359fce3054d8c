// src/repositories/cross_reference.rs
//
// Cross references between combinations and shared content
//
// Imports associate thousands of content rows with a combination at once,
// so associations are managed set-at-a-time directly on the join tables
// instead of loading and mutating content entities one by one.
//
// CRITICAL RULES:
// - Join table names come from the registry only, validated at startup
// - A missing or incomplete registration is a configuration error
// - insert is insert-if-absent; duplicates are skipped, never doubled
// - Empty id lists never reach the database

use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use crate::config::DEFAULT_INSERT_BATCH_SIZE;
use crate::db::ConnectionPool;
use crate::domain::{ContentEntity, ContentKind};
use crate::error::{AppError, AppResult};
use crate::repositories::bulk::placeholders;

/// Names describing one combination <-> content join table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub table: &'static str,
    pub combination_column: &'static str,
    pub content_column: &'static str,
}

impl Relation {
    pub const fn new(
        table: &'static str,
        combination_column: &'static str,
        content_column: &'static str,
    ) -> Self {
        Self {
            table,
            combination_column,
            content_column,
        }
    }
}

/// Static table of content kind -> join table relation.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    relations: HashMap<ContentKind, Relation>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The relations of the bundled schema.
    pub fn standard() -> Self {
        let mut relations = HashMap::new();
        relations.insert(
            ContentKind::Category,
            Relation::new("combination_category", "combination_id", "category_id"),
        );
        relations.insert(
            ContentKind::Item,
            Relation::new("combination_item", "combination_id", "item_id"),
        );
        relations.insert(
            ContentKind::Recipe,
            Relation::new("combination_recipe", "combination_id", "recipe_id"),
        );
        relations.insert(
            ContentKind::Technology,
            Relation::new("combination_technology", "combination_id", "technology_id"),
        );
        Self { relations }
    }

    /// Registers the relation for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: ContentKind, relation: Relation) -> AppResult<()> {
        for name in [
            relation.table,
            relation.combination_column,
            relation.content_column,
        ] {
            if !is_sql_identifier(name) {
                return Err(AppError::Configuration(format!(
                    "relation for {} has invalid name `{}`",
                    kind, name
                )));
            }
        }
        self.relations.insert(kind, relation);
        Ok(())
    }

    pub fn relation(&self, kind: ContentKind) -> AppResult<&Relation> {
        self.relations.get(&kind).ok_or_else(|| {
            AppError::Configuration(format!("no combination relation registered for {}", kind))
        })
    }

    /// Checks every registered relation against the live schema.
    pub fn validate(&self, conn: &Connection) -> AppResult<()> {
        let mut kinds: Vec<&ContentKind> = self.relations.keys().collect();
        kinds.sort();

        for kind in kinds {
            let relation = &self.relations[kind];
            let columns = table_columns(conn, relation.table)?;
            if columns.is_empty() {
                return Err(AppError::Configuration(format!(
                    "join table `{}` for {} does not exist",
                    relation.table, kind
                )));
            }
            for column in [relation.combination_column, relation.content_column] {
                if !columns.iter().any(|c| c == column) {
                    return Err(AppError::Configuration(format!(
                        "join table `{}` for {} has no column `{}`",
                        relation.table, kind, column
                    )));
                }
            }
        }

        Ok(())
    }
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn table_columns(conn: &Connection, table: &str) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Builds cross-reference managers from a validated registry.
pub struct CrossReferenceFactory {
    pool: Arc<ConnectionPool>,
    registry: RelationRegistry,
    insert_batch_size: usize,
}

impl CrossReferenceFactory {
    /// Validates `registry` against the database before accepting it.
    pub fn new(pool: Arc<ConnectionPool>, registry: RelationRegistry) -> AppResult<Self> {
        {
            let conn = pool.get()?;
            registry.validate(&conn)?;
        }
        Ok(Self {
            pool,
            registry,
            insert_batch_size: DEFAULT_INSERT_BATCH_SIZE,
        })
    }

    pub fn with_insert_batch_size(mut self, insert_batch_size: usize) -> Self {
        self.insert_batch_size = insert_batch_size.max(1);
        self
    }

    pub fn create(&self, kind: ContentKind) -> AppResult<CrossReferenceManager> {
        let relation = self.registry.relation(kind)?.clone();
        Ok(CrossReferenceManager {
            pool: self.pool.clone(),
            kind,
            relation,
            insert_batch_size: self.insert_batch_size,
        })
    }

    pub fn for_entity<E: ContentEntity>(&self) -> AppResult<CrossReferenceManager> {
        self.create(E::KIND)
    }
}

/// Bulk operations on one combination <-> content join table.
#[derive(Clone)]
pub struct CrossReferenceManager {
    pool: Arc<ConnectionPool>,
    kind: ContentKind,
    relation: Relation,
    insert_batch_size: usize,
}

impl CrossReferenceManager {
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    /// Removes every association of `combination_id`. Returns rows removed.
    pub fn clear(&self, combination_id: Uuid) -> AppResult<usize> {
        let conn = self.pool.get()?;
        self.clear_in(&conn, combination_id)
    }

    /// `clear` on a connection the caller controls.
    pub fn clear_in(&self, conn: &Connection, combination_id: Uuid) -> AppResult<usize> {
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1",
                self.relation.table, self.relation.combination_column
            ),
            params![combination_id],
        )?;
        log::debug!(
            "cleared {} {} associations of combination {}",
            removed,
            self.kind,
            combination_id
        );
        Ok(removed)
    }

    /// Associates `content_ids` with `combination_id`, skipping pairs that
    /// already exist. Returns the number of new rows.
    pub fn insert(&self, combination_id: Uuid, content_ids: &[Uuid]) -> AppResult<usize> {
        if content_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let inserted = self.insert_in(&tx, combination_id, content_ids)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// `insert` on a connection the caller controls. Content rows must be
    /// visible on `conn`.
    pub fn insert_in(
        &self,
        conn: &Connection,
        combination_id: Uuid,
        content_ids: &[Uuid],
    ) -> AppResult<usize> {
        if content_ids.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0;

        for chunk in content_ids.chunks(self.insert_batch_size) {
            let rows = vec!["(?, ?)"; chunk.len()].join(", ");
            let sql = format!(
                "INSERT OR IGNORE INTO {} ({}, {}) VALUES {}",
                self.relation.table,
                self.relation.combination_column,
                self.relation.content_column,
                rows
            );
            let values = chunk.iter().flat_map(|id| [combination_id, *id]);
            inserted += conn.execute(&sql, params_from_iter(values))?;
        }

        log::debug!(
            "associated {} new {} rows with combination {} ({} requested)",
            inserted,
            self.kind,
            combination_id,
            content_ids.len()
        );
        Ok(inserted)
    }

    /// Drops the given associations only. Returns rows removed.
    pub fn remove(&self, combination_id: Uuid, content_ids: &[Uuid]) -> AppResult<usize> {
        if content_ids.is_empty() {
            return Ok(0);
        }

        let conn = self.pool.get()?;
        let mut removed = 0;

        for chunk in content_ids.chunks(self.insert_batch_size) {
            let sql = format!(
                "DELETE FROM {} WHERE {} = ? AND {} IN ({})",
                self.relation.table,
                self.relation.combination_column,
                self.relation.content_column,
                placeholders(chunk.len())
            );
            let values = std::iter::once(combination_id).chain(chunk.iter().copied());
            removed += conn.execute(&sql, params_from_iter(values))?;
        }

        Ok(removed)
    }

    /// Number of associations of `combination_id`; 0 when there are none.
    pub fn count(&self, combination_id: Uuid) -> AppResult<u64> {
        let conn = self.pool.get()?;
        let count: Option<i64> = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = ?1",
                    self.relation.table, self.relation.combination_column
                ),
                params![combination_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0).max(0) as u64)
    }

    /// Content ids associated with `combination_id`.
    pub fn content_ids(&self, combination_id: Uuid) -> AppResult<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            self.relation.content_column, self.relation.table, self.relation.combination_column
        ))?;
        let ids = stmt
            .query_map(params![combination_id], |row| row.get::<_, Uuid>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_connection;
    use crate::db::initialize_database;

    #[test]
    fn test_standard_registry_covers_every_kind() {
        let registry = RelationRegistry::standard();
        for kind in ContentKind::ALL {
            assert!(registry.relation(kind).is_ok(), "missing relation for {}", kind);
        }
    }

    #[test]
    fn test_missing_relation_is_configuration_error() {
        let registry = RelationRegistry::new();
        let err = registry.relation(ContentKind::Recipe).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_register_rejects_non_identifiers() {
        let mut registry = RelationRegistry::new();
        let result = registry.register(
            ContentKind::Item,
            Relation::new("combination_item; DROP TABLE items", "combination_id", "item_id"),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert!(registry.relation(ContentKind::Item).is_err());
    }

    #[test]
    fn test_standard_registry_matches_schema() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        RelationRegistry::standard().validate(&conn).unwrap();
    }

    #[test]
    fn test_validate_detects_missing_table() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();

        let mut registry = RelationRegistry::new();
        registry
            .register(
                ContentKind::Item,
                Relation::new("combination_items", "combination_id", "item_id"),
            )
            .unwrap();

        let err = registry.validate(&conn).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_detects_missing_column() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();

        let mut registry = RelationRegistry::new();
        registry
            .register(
                ContentKind::Recipe,
                Relation::new("combination_recipe", "combination_id", "content_id"),
            )
            .unwrap();

        let err = registry.validate(&conn).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("content_id"));
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_sql_identifier("combination_item"));
        assert!(is_sql_identifier("_x1"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("1abc"));
        assert!(!is_sql_identifier("a-b"));
    }
}
