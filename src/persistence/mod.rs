// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Durable mirror of the address space
//!
//! Coils and holding registers are mirrored into a keyed record store, one
//! record per address, so that their state survives the process. The mirror
//! is maintained by the [`Synchronizer`], a periodic background task: readers
//! of the store may observe values up to one synchronization interval old.
//!
//! ## Layout
//!
//! Two tables, `coils(id, value BOOLEAN)` and `registers(id, value INTEGER)`,
//! one row per address. Rows are seeded with defaults on first
//! initialization, only ever updated in place and never deleted.
//!
//! ## Stores
//!
//! * [`SqliteRecordStore`]: SQLite database file, the production store
//! * [`MemoryRecordStore`]: process-local store, used when no database is
//!   configured and in tests

pub mod memory;
pub mod sqlite;
pub mod synchronizer;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;
pub use synchronizer::{SyncReport, Synchronizer};

use async_trait::async_trait;
use thiserror::Error;

use crate::address_space::{BankKind, CellValue};

/// Persisted table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Coils,
    Registers,
}

impl Table {
    pub const ALL: [Table; 2] = [Table::Coils, Table::Registers];

    pub fn name(self) -> &'static str {
        match self {
            Table::Coils => "coils",
            Table::Registers => "registers",
        }
    }

    /// Address space bank mirrored by this table
    pub fn bank(self) -> BankKind {
        match self {
            Table::Coils => BankKind::Coil,
            Table::Registers => BankKind::HoldingRegister,
        }
    }
}

/// One durable `(id, value)` pair.
///
/// The table a record belongs to follows from its value: booleans go to
/// `coils`, integers to `registers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedRecord {
    pub id: u16,
    pub value: CellValue,
}

impl PersistedRecord {
    pub fn new(id: u16, value: impl Into<CellValue>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }

    pub fn table(&self) -> Table {
        match self.value {
            CellValue::Bit(_) => Table::Coils,
            CellValue::Word(_) => Table::Registers,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record {id} in table {table} holds an invalid value: {value}")]
    Corrupt {
        table: &'static str,
        id: i64,
        value: i64,
    },

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed record persistence for the coil and register mirrors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a default record for every id in `0..len` that does not exist
    /// yet. Existing records are left untouched.
    async fn seed(&self, table: Table, len: usize) -> Result<(), StoreError>;

    /// Insert or update the record with the same id.
    async fn upsert(&self, record: PersistedRecord) -> Result<(), StoreError>;

    /// All records of a table, ordered by id.
    async fn load(&self, table: Table) -> Result<Vec<PersistedRecord>, StoreError>;
}
