// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Persistence synchronizer configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Database value selecting the in-memory record store.
pub const MEMORY_DATABASE: &str = ":memory:";

/// Configuration for the periodic copy of coils and holding registers to
/// the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable or disable the synchronizer. Default is `true`.
    pub enabled: bool,

    /// Path of the SQLite database, or `:memory:` for a process-local store.
    /// Default is "modbus.db".
    pub database: String,

    /// Period between two synchronization cycles in milliseconds.
    /// Default is 5000.
    pub interval_ms: u64,

    /// Load persisted coils and holding registers into the address space
    /// before the slave bridge starts. Default is `false`.
    #[serde(default)]
    pub restore_on_start: bool,
}

impl PersistenceConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database == MEMORY_DATABASE
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database: "modbus.db".to_string(),
            interval_ms: 5000,
            restore_on_start: false,
        }
    }
}
