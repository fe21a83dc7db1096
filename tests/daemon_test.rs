// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::time::Duration;

use anyhow::Result;
use tempfile::tempdir;
use tokio::time;
use tokio_modbus::prelude::*;

use rust_modbus_bridge::address_space::{BankKind, CellValue};
use rust_modbus_bridge::config::Config;
use rust_modbus_bridge::daemon::Daemon;
use rust_modbus_bridge::persistence::{RecordStore, SqliteRecordStore, Table};

fn test_config() -> Config {
    let mut config = Config::default();
    config.modbus.address = "127.0.0.1".to_string();
    config.modbus.port = 0;
    config.modbus.bank_size = 200;
    config.persistence.database = ":memory:".to_string();
    config.persistence.interval_ms = 50;
    config.api.enabled = false;
    config
}

#[tokio::test]
async fn test_daemon_serves_the_address_space() -> Result<()> {
    let mut daemon = Daemon::new();
    daemon.launch(&test_config()).await?;

    let addr = daemon.modbus_addr().expect("slave bridge started");
    let mut ctx = tcp::connect(addr).await?;
    ctx.write_single_register(150, 1500).await??;
    assert_eq!(
        daemon
            .address_space()
            .read_words(BankKind::HoldingRegister, 150, 1)?,
        vec![1500]
    );

    // The bank size comes from the configuration
    let result = ctx.read_coils(199, 2).await?;
    assert_eq!(result, Err(ExceptionCode::IllegalDataAddress));
    ctx.disconnect().await?;

    daemon.shutdown();
    time::timeout(Duration::from_secs(2), daemon.join()).await??;
    Ok(())
}

#[tokio::test]
async fn test_daemon_without_services() -> Result<()> {
    let mut config = test_config();
    config.modbus.enabled = false;
    config.persistence.enabled = false;

    let mut daemon = Daemon::new();
    daemon.launch(&config).await?;
    assert!(daemon.modbus_addr().is_none());

    daemon.shutdown();
    daemon.join().await?;
    Ok(())
}

#[tokio::test]
async fn test_shutdown_persists_pending_writes() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("modbus.db");

    let mut config = test_config();
    config.persistence.database = db.display().to_string();
    config.persistence.interval_ms = 60_000;

    let mut daemon = Daemon::new();
    daemon.launch(&config).await?;

    let addr = daemon.modbus_addr().expect("slave bridge started");
    let mut ctx = tcp::connect(addr).await?;
    ctx.write_single_coil(104, true).await??;
    ctx.write_single_register(103, 123).await??;
    ctx.disconnect().await?;

    daemon.shutdown();
    time::timeout(Duration::from_secs(2), daemon.join()).await??;

    let store = SqliteRecordStore::open(&db).await?;
    assert_eq!(store.load(Table::Coils).await?[104].value, CellValue::Bit(true));
    assert_eq!(
        store.load(Table::Registers).await?[103].value,
        CellValue::Word(123)
    );
    Ok(())
}
