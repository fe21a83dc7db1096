// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Periodic mirror of the address space into the record store
//!
//! Every cycle snapshots the full coil bank and the full holding register
//! bank, then upserts one record per address. A failed write is logged and
//! counted, the remaining addresses are still written and the next cycle
//! runs on schedule. Nothing is retried and nothing is read back. On
//! shutdown one last cycle flushes the writes made since the previous one.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time;

use super::{PersistedRecord, RecordStore, StoreError, Table};
use crate::address_space::AddressSpace;

/// How often a waiting synchronizer checks for shutdown
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of one synchronization cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records successfully written
    pub written: usize,
    /// Records whose write failed
    pub failed: usize,
}

pub struct Synchronizer {
    space: Arc<AddressSpace>,
    store: Arc<dyn RecordStore>,
    interval: Duration,
}

impl Synchronizer {
    /// Period of the reference deployment
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new(space: Arc<AddressSpace>, store: Arc<dyn RecordStore>, interval: Duration) -> Self {
        Self {
            space,
            store,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Seed both tables with default rows and, when `restore` is set, load
    /// the persisted values back into the address space.
    ///
    /// Records with an id outside the address space are skipped.
    pub async fn initialize(&self, restore: bool) -> Result<(), StoreError> {
        let bank_size = self.space.bank_size();
        for table in Table::ALL {
            self.store.seed(table, bank_size).await?;
        }

        if restore {
            let mut restored = 0;
            for table in Table::ALL {
                for record in self.store.load(table).await? {
                    match self.space.set(table.bank(), record.id, record.value) {
                        Ok(_) => restored += 1,
                        Err(e) => warn!("Skipping persisted record {}: {}", record.id, e),
                    }
                }
            }
            info!("Restored {} persisted values into the address space", restored);
        }
        Ok(())
    }

    /// Run a single synchronization cycle.
    pub async fn run_cycle(&self) -> SyncReport {
        // One consistent snapshot per bank, taken before any write
        let coils = self.space.snapshot(Table::Coils.bank());
        let registers = self.space.snapshot(Table::Registers.bank());

        let mut report = SyncReport::default();
        for (index, value) in coils.into_iter().chain(registers).enumerate() {
            let id = (index % self.space.bank_size()) as u16;
            let record = PersistedRecord { id, value };
            match self.store.upsert(record).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        "Failed to persist {} record {}: {}",
                        record.table().name(),
                        id,
                        e
                    );
                }
            }
        }

        if report.failed > 0 {
            warn!(
                "Synchronization cycle finished with {} failed writes ({} written)",
                report.failed, report.written
            );
        } else {
            debug!("Synchronized {} records", report.written);
        }
        report
    }

    /// Run cycles every `interval` until `running` is cleared.
    ///
    /// The first cycle runs one full interval after the call. Clearing
    /// `running` interrupts the wait and triggers one last cycle, so writes
    /// made before shutdown reach the store.
    pub async fn run(self, running: Arc<AtomicBool>) {
        info!(
            "Persistence synchronizer started (interval {:?})",
            self.interval
        );
        loop {
            tokio::select! {
                _ = time::sleep(self.interval) => {
                    self.run_cycle().await;
                }
                _ = stopped(&running) => break,
            }
        }

        let report = self.run_cycle().await;
        info!(
            "Persistence synchronizer stopped after a final cycle ({} written, {} failed)",
            report.written, report.failed
        );
    }
}

/// Resolves once `running` has been cleared
async fn stopped(running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        time::sleep(STOP_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_space::{BankKind, CellValue};
    use crate::persistence::{MemoryRecordStore, MockRecordStore};
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn one_failed_write_does_not_abort_the_cycle() {
        let space = Arc::new(AddressSpace::new(10));
        let mut store = MockRecordStore::new();
        store.expect_upsert().times(20).returning(|record| {
            if record.table() == Table::Coils && record.id == 5 {
                Err(StoreError::Unavailable("disk full".to_string()))
            } else {
                Ok(())
            }
        });

        let sync = Synchronizer::new(space, Arc::new(store), Duration::from_millis(10));
        let report = sync.run_cycle().await;
        assert_eq!(report, SyncReport { written: 19, failed: 1 });
    }

    #[tokio::test]
    async fn failed_cycles_do_not_stop_the_schedule() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut store = MockRecordStore::new();
        {
            let calls = Arc::clone(&calls);
            store.expect_upsert().returning(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Unavailable("offline".to_string()))
            });
        }

        let space = Arc::new(AddressSpace::new(2));
        let sync = Synchronizer::new(space, Arc::new(store), Duration::from_millis(10));
        let running = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(sync.run(Arc::clone(&running)));

        time::sleep(Duration::from_millis(100)).await;
        running.store(false, Ordering::SeqCst);
        task.await.unwrap();

        // Each cycle attempts 4 writes; several cycles must have run
        assert!(calls.load(Ordering::SeqCst) >= 8);
    }

    #[tokio::test]
    async fn shutdown_flushes_pending_writes() {
        let space = Arc::new(AddressSpace::new(200));
        let store = Arc::new(MemoryRecordStore::new());
        let sync = Synchronizer::new(Arc::clone(&space), store.clone(), Duration::from_secs(60));
        sync.initialize(false).await.unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(sync.run(Arc::clone(&running)));

        space.write_bit(BankKind::Coil, 104, true).unwrap();
        space.write_word(BankKind::HoldingRegister, 103, 123).unwrap();
        running.store(false, Ordering::SeqCst);

        time::timeout(Duration::from_secs(1), task)
            .await
            .expect("synchronizer stops without waiting a full interval")
            .unwrap();
        assert_eq!(store.get(Table::Coils, 104), Some(CellValue::Bit(true)));
        assert_eq!(store.get(Table::Registers, 103), Some(CellValue::Word(123)));
    }

    #[tokio::test]
    async fn records_track_the_address_space() {
        let space = Arc::new(AddressSpace::new(1000));
        let store = Arc::new(MemoryRecordStore::new());
        let sync = Synchronizer::new(
            Arc::clone(&space),
            store.clone(),
            Synchronizer::DEFAULT_INTERVAL,
        );
        sync.initialize(false).await.unwrap();
        assert_eq!(store.len(Table::Coils), 1000);
        assert_eq!(store.get(Table::Registers, 999), Some(CellValue::Word(0)));

        space.write_bit(BankKind::Coil, 104, true).unwrap();
        space.write_word(BankKind::HoldingRegister, 103, 123).unwrap();

        let first = sync.run_cycle().await;
        assert_eq!(first, SyncReport { written: 2000, failed: 0 });
        assert_eq!(store.get(Table::Coils, 104), Some(CellValue::Bit(true)));
        assert_eq!(store.get(Table::Registers, 103), Some(CellValue::Word(123)));

        let before = store.load(Table::Registers).await.unwrap();
        sync.run_cycle().await;
        assert_eq!(store.load(Table::Registers).await.unwrap(), before);
    }

    #[tokio::test]
    async fn restore_loads_persisted_values() {
        let store = Arc::new(MemoryRecordStore::new());
        store.upsert(PersistedRecord::new(7, true)).await.unwrap();
        store.upsert(PersistedRecord::new(8, 4242u16)).await.unwrap();
        // Outside a 100-cell address space
        store.upsert(PersistedRecord::new(500, 1u16)).await.unwrap();

        let space = Arc::new(AddressSpace::new(100));
        let sync = Synchronizer::new(Arc::clone(&space), store, Duration::from_secs(1));
        sync.initialize(true).await.unwrap();

        assert_eq!(space.read_bits(BankKind::Coil, 7, 1).unwrap(), vec![true]);
        assert_eq!(
            space.read_words(BankKind::HoldingRegister, 8, 1).unwrap(),
            vec![4242]
        );
    }
}
