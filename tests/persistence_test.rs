// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Tests for the SQLite record store and the persistence synchronizer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tempfile::tempdir;
use tokio::time;

use rust_modbus_bridge::address_space::{AddressSpace, BankKind, CellValue};
use rust_modbus_bridge::persistence::{
    PersistedRecord, RecordStore, SqliteRecordStore, StoreError, Synchronizer, Table,
};

#[tokio::test]
async fn test_seed_keeps_existing_records() -> Result<()> {
    let dir = tempdir()?;
    let store = SqliteRecordStore::open(dir.path().join("modbus.db")).await?;

    store.seed(Table::Coils, 10).await?;
    store.upsert(PersistedRecord::new(3, true)).await?;
    store.seed(Table::Coils, 10).await?;

    let coils = store.load(Table::Coils).await?;
    assert_eq!(coils.len(), 10);
    assert_eq!(coils[3], PersistedRecord::new(3, true));
    assert!(coils
        .iter()
        .filter(|r| r.id != 3)
        .all(|r| r.value == CellValue::Bit(false)));

    assert!(store.load(Table::Registers).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_synchronizer_converges_to_memory() -> Result<()> {
    let dir = tempdir()?;
    let store = Arc::new(SqliteRecordStore::open(dir.path().join("modbus.db")).await?);
    let space = Arc::new(AddressSpace::new(1000));
    let synchronizer = Synchronizer::new(
        Arc::clone(&space),
        store.clone(),
        Synchronizer::DEFAULT_INTERVAL,
    );
    synchronizer.initialize(false).await?;

    space.write_bit(BankKind::Coil, 104, true)?;
    space.write_word(BankKind::HoldingRegister, 103, 123)?;
    space.write_word(BankKind::HoldingRegister, 999, u16::MAX)?;

    let report = synchronizer.run_cycle().await;
    assert_eq!(report.written, 2000);
    assert_eq!(report.failed, 0);

    let coils = store.load(Table::Coils).await?;
    let registers = store.load(Table::Registers).await?;
    assert_eq!(coils.len(), 1000);
    assert_eq!(registers.len(), 1000);
    assert_eq!(coils[104].value, CellValue::Bit(true));
    assert_eq!(registers[103].value, CellValue::Word(123));
    assert_eq!(registers[999].value, CellValue::Word(u16::MAX));

    // A second cycle without writes leaves the records unchanged
    synchronizer.run_cycle().await;
    assert_eq!(store.load(Table::Coils).await?, coils);
    assert_eq!(store.load(Table::Registers).await?, registers);
    Ok(())
}

#[tokio::test]
async fn test_restore_on_start() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("modbus.db");

    {
        let store = SqliteRecordStore::open(&db).await?;
        store.seed(Table::Coils, 100).await?;
        store.seed(Table::Registers, 100).await?;
        store.upsert(PersistedRecord::new(7, true)).await?;
        store.upsert(PersistedRecord::new(8, 88u16)).await?;
        // Outside the bank of the restarted process
        store.upsert(PersistedRecord::new(500, 5u16)).await?;
    }

    let space = Arc::new(AddressSpace::new(100));
    let store = Arc::new(SqliteRecordStore::open(&db).await?);
    Synchronizer::new(Arc::clone(&space), store, Synchronizer::DEFAULT_INTERVAL)
        .initialize(true)
        .await?;

    assert_eq!(space.read_bits(BankKind::Coil, 6, 2)?, vec![false, true]);
    assert_eq!(space.read_words(BankKind::HoldingRegister, 8, 1)?, vec![88]);

    // Without restore the address space keeps its defaults
    let fresh = Arc::new(AddressSpace::new(100));
    let store = Arc::new(SqliteRecordStore::open(&db).await?);
    Synchronizer::new(Arc::clone(&fresh), store, Synchronizer::DEFAULT_INTERVAL)
        .initialize(false)
        .await?;
    assert_eq!(fresh.read_bits(BankKind::Coil, 7, 1)?, vec![false]);
    Ok(())
}

#[tokio::test]
async fn test_out_of_domain_register_is_reported() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("modbus.db");
    let store = SqliteRecordStore::open(&db).await?;

    let pool = sqlx::SqlitePool::connect(&format!("sqlite://{}", db.display())).await?;
    sqlx::query("INSERT INTO registers (id, value) VALUES (1, 70000)")
        .execute(&pool)
        .await?;
    pool.close().await;

    match store.load(Table::Registers).await {
        Err(StoreError::Corrupt { table, id, value }) => {
            assert_eq!(table, "registers");
            assert_eq!(id, 1);
            assert_eq!(value, 70000);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_periodic_run_until_shutdown() -> Result<()> {
    let dir = tempdir()?;
    let store = Arc::new(SqliteRecordStore::open(dir.path().join("modbus.db")).await?);
    let space = Arc::new(AddressSpace::new(50));
    let synchronizer = Synchronizer::new(
        Arc::clone(&space),
        store.clone(),
        Duration::from_millis(50),
    );
    synchronizer.initialize(false).await?;

    let running = Arc::new(AtomicBool::new(true));
    let task = tokio::spawn(synchronizer.run(running.clone()));

    space.write_word(BankKind::HoldingRegister, 10, 1010)?;
    time::sleep(Duration::from_millis(300)).await;

    let registers = store.load(Table::Registers).await?;
    assert_eq!(registers[10].value, CellValue::Word(1010));

    running.store(false, Ordering::SeqCst);
    time::timeout(Duration::from_secs(1), task).await??;
    Ok(())
}
