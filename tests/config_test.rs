// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_modbus_bridge::config::{Config, ModbusConfig, CONFIG_SCHEMA};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let mut config = Config::default();
    config.modbus = ModbusConfig {
        enabled: true,
        port: 1502,
        address: "0.0.0.0".to_string(),
        bank_size: 200,
    };
    config.persistence.database = ":memory:".to_string();
    config.missions.reset_coil_start = 10;
    config.missions.reset_coil_end = 12;

    config.save_to_file(&config_path)?;
    let loaded_config = Config::from_file(&config_path)?;

    assert_eq!(loaded_config.modbus.port, 1502);
    assert_eq!(loaded_config.modbus.bank_size, 200);
    assert!(loaded_config.persistence.is_in_memory());
    assert_eq!(loaded_config.missions.reset_coils(), 10..=12);

    // Loading a missing file writes the defaults
    let non_existent_path = temp_dir.path().join("non_existent.yaml");
    let default_config = Config::from_file(&non_existent_path)?;
    assert!(non_existent_path.exists());
    assert_eq!(default_config.modbus.port, 5020);
    assert_eq!(default_config.modbus.bank_size, 1000);
    assert_eq!(default_config.api.port, 8000);
    assert_eq!(default_config.persistence.interval_ms, 5000);
    assert!(!default_config.persistence.restore_on_start);
    assert_eq!(default_config.missions.reset_coils(), 100..=110);

    Ok(())
}

#[test]
fn test_partial_config_uses_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        "device:\n  address: 10.0.0.5\n  port: 502\n",
    )?;

    let config = Config::from_file(&config_path)?;
    assert_eq!(config.device.socket_addr()?.to_string(), "10.0.0.5:502");
    assert_eq!(config.device.unit_id, 1);
    assert_eq!(config.device.timeout_ms, 3000);
    assert_eq!(config.modbus.port, 5020);
    assert_eq!(
        config.api.allowed_origins,
        vec!["http://localhost:3000", "http://192.168.1.53:3000"]
    );
    Ok(())
}

#[test]
fn test_schema_violation_creates_sample() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        "modbus:\n  enabled: true\n  port: 5020\n  address: 127.0.0.1\n  bank_size: 70000\n",
    )?;

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("Configuration validation failed"));
    assert!(temp_dir.path().join("config.sample.yaml").exists());
    Ok(())
}

#[test]
fn test_unknown_section_is_rejected() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "dashboard:\n  port: 8080\n")?;

    assert!(Config::from_file(&config_path).is_err());
    Ok(())
}

#[test]
fn test_specific_rules_are_applied() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let mut config = Config::default();
    config.missions.reset_coil_start = 120;
    config.save_to_file(&config_path)?;

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("Invalid reset coil range"));
    assert!(temp_dir.path().join("config.sample.yaml").exists());
    Ok(())
}

#[test]
fn test_apply_args() {
    let mut config = Config::default();
    config.apply_args(
        Some(9000),
        Some("127.0.0.1".to_string()),
        Some(false),
        None,
        Some(1502),
        Some("10.1.1.1".to_string()),
        Some(502),
        Some(":memory:".to_string()),
        Some("http://missions.local:8080".to_string()),
    );

    assert_eq!(config.api.port, 9000);
    assert_eq!(config.api.address, "127.0.0.1");
    assert!(!config.modbus.enabled);
    assert_eq!(config.modbus.address, "127.0.0.1");
    assert_eq!(config.modbus.port, 1502);
    assert_eq!(config.device.address, "10.1.1.1");
    assert_eq!(config.device.port, 502);
    assert!(config.persistence.is_in_memory());
    assert_eq!(config.missions.base_url, "http://missions.local:8080");
}

#[test]
fn test_embedded_schema_is_valid_json() -> Result<()> {
    let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA)?;
    assert!(schema["properties"]["modbus"].is_object());
    assert!(schema["properties"]["missions"].is_object());
    Ok(())
}

#[test]
fn test_config_schema_output() -> Result<()> {
    rust_modbus_bridge::config::output_config_schema()?;
    Ok(())
}
