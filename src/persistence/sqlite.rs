// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! SQLite record store
//!
//! The database holds the `coils` and `registers` tables. It is opened in WAL
//! mode so that external readers can inspect the mirror while the
//! synchronizer writes to it.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use super::{PersistedRecord, RecordStore, StoreError, Table};
use crate::address_space::CellValue;

#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
    path: String,
}

impl SqliteRecordStore {
    /// Open (or create) the database file and make sure both tables exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&path_str)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS coils (
                id INTEGER PRIMARY KEY,
                value BOOLEAN NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS registers (
                id INTEGER PRIMARY KEY,
                value INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        info!("Record store opened at {}", path_str);
        Ok(Self {
            pool,
            path: path_str,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn seed(&self, table: Table, len: usize) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (id, value) VALUES (?, ?)",
            table.name()
        );
        let mut tx = self.pool.begin().await?;
        for id in 0..len as i64 {
            let query = sqlx::query(&sql).bind(id);
            let query = match table {
                Table::Coils => query.bind(false),
                Table::Registers => query.bind(0_i64),
            };
            query.execute(&mut *tx).await?;
        }
        tx.commit().await?;
        debug!("Seeded {} rows in table {}", len, table.name());
        Ok(())
    }

    async fn upsert(&self, record: PersistedRecord) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (id, value) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET value = excluded.value",
            record.table().name()
        );
        let query = sqlx::query(&sql).bind(i64::from(record.id));
        let query = match record.value {
            CellValue::Bit(b) => query.bind(b),
            CellValue::Word(w) => query.bind(i64::from(w)),
        };
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn load(&self, table: Table) -> Result<Vec<PersistedRecord>, StoreError> {
        let sql = format!("SELECT id, value FROM {} ORDER BY id", table.name());
        let rows: Vec<(i64, i64)> = match table {
            Table::Coils => sqlx::query_as::<_, (i64, bool)>(&sql)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|(id, value)| (id, i64::from(value)))
                .collect(),
            Table::Registers => sqlx::query_as(&sql).fetch_all(&self.pool).await?,
        };

        rows.into_iter()
            .map(|(id, value)| {
                let corrupt = || StoreError::Corrupt {
                    table: table.name(),
                    id,
                    value,
                };
                let id = u16::try_from(id).map_err(|_| corrupt())?;
                let value = match table {
                    Table::Coils => CellValue::Bit(value != 0),
                    Table::Registers => {
                        CellValue::Word(u16::try_from(value).map_err(|_| corrupt())?)
                    }
                };
                Ok(PersistedRecord { id, value })
            })
            .collect()
    }
}
