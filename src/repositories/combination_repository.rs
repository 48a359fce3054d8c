// src/repositories/combination_repository.rs

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::domain::{Combination, CombinationStatus};
use crate::error::AppResult;

pub trait CombinationRepository: Send + Sync {
    fn save(&self, combination: &Combination) -> AppResult<()>;
    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Combination>>;
    fn list(&self) -> AppResult<Vec<Combination>>;
    /// Deletes the combination row; join rows follow through the cascade.
    fn delete(&self, id: Uuid) -> AppResult<bool>;
    fn exists(&self, id: Uuid) -> AppResult<bool>;
}

pub struct SqliteCombinationRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteCombinationRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_combination(row: &Row) -> Result<Combination, rusqlite::Error> {
        let mod_names: String = row.get("mod_names")?;
        let mod_names: Vec<String> = serde_json::from_str(&mod_names)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

        let status: String = row.get("status")?;
        let status = CombinationStatus::from_str(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        let created_at = parse_timestamp(3, &row.get::<_, String>("created_at")?)?;
        let imported_at = match row.get::<_, Option<String>>("imported_at")? {
            Some(value) => Some(parse_timestamp(4, &value)?),
            None => None,
        };

        Ok(Combination {
            id: row.get("id")?,
            mod_names,
            status,
            created_at,
            imported_at,
        })
    }
}

fn parse_timestamp(column: usize, value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

impl CombinationRepository for SqliteCombinationRepository {
    fn save(&self, combination: &Combination) -> AppResult<()> {
        let conn = self.pool.get()?;
        let mod_names = serde_json::to_string(&combination.mod_names)?;

        // Upsert keeps the row in place so join rows do not cascade away.
        conn.execute(
            "INSERT INTO combinations (id, mod_names, status, created_at, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                mod_names = excluded.mod_names,
                status = excluded.status,
                imported_at = excluded.imported_at",
            params![
                combination.id,
                mod_names,
                combination.status.to_string(),
                combination.created_at.to_rfc3339(),
                combination.imported_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Combination>> {
        let conn = self.pool.get()?;
        let combination = conn
            .query_row(
                "SELECT id, mod_names, status, created_at, imported_at
                 FROM combinations WHERE id = ?1",
                params![id],
                Self::row_to_combination,
            )
            .optional()?;
        Ok(combination)
    }

    fn list(&self) -> AppResult<Vec<Combination>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, mod_names, status, created_at, imported_at
             FROM combinations ORDER BY created_at",
        )?;
        let combinations = stmt
            .query_map([], Self::row_to_combination)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(combinations)
    }

    fn delete(&self, id: Uuid) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM combinations WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn exists(&self, id: Uuid) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM combinations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}
