// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Process-local record store

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{PersistedRecord, RecordStore, StoreError, Table};
use crate::address_space::CellValue;

/// Record store keeping everything in a map. Contents are lost when the
/// process exits.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<(Table, u16), CellValue>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of one record
    pub fn get(&self, table: Table, id: u16) -> Option<CellValue> {
        self.records.lock().get(&(table, id)).copied()
    }

    /// Number of records in a table
    pub fn len(&self, table: Table) -> usize {
        self.records
            .lock()
            .keys()
            .filter(|(t, _)| *t == table)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn seed(&self, table: Table, len: usize) -> Result<(), StoreError> {
        let default = table.bank().default_value();
        let mut records = self.records.lock();
        for id in (0..len).filter_map(|id| u16::try_from(id).ok()) {
            records.entry((table, id)).or_insert(default);
        }
        Ok(())
    }

    async fn upsert(&self, record: PersistedRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .insert((record.table(), record.id), record.value);
        Ok(())
    }

    async fn load(&self, table: Table) -> Result<Vec<PersistedRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|((t, _), _)| *t == table)
            .map(|(&(_, id), &value)| PersistedRecord { id, value })
            .collect())
    }
}
