// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! Validation rules that the JSON schema cannot express, and schema output.

use anyhow::{Context, Result};
use log::{debug, warn};
use url::Url;

use super::{Config, CONFIG_SCHEMA};

/// Output the embedded JSON schema to the console.
///
/// Called when the `--show-config-schema` flag is provided on the command
/// line.
///
/// ```bash
/// ./rust_modbus_bridge --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Check if a string is a valid IP address, or one of the special values
/// "localhost", "::" and "0.0.0.0".
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Validates the configuration against additional rules that aren't covered
/// by the JSON schema.
///
/// # Validation Rules
///
/// - **Bank size**: between 1 and 65535 cells, so every cell is addressable
/// - **Ports**: the slave bridge, API and device ports are non zero
/// - **Device address**: must be an IP address, the gateway does not resolve
///   host names
/// - **Mission service**: the base URL parses and the reset coil range is
///   ordered
/// - **Persistence interval**: non zero when persistence is enabled
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.modbus.bank_size == 0 || config.modbus.bank_size > usize::from(u16::MAX) {
        anyhow::bail!(
            "Invalid bank size {}: expected 1 to {}",
            config.modbus.bank_size,
            u16::MAX
        );
    }

    for (name, port) in [
        ("Modbus", config.modbus.port),
        ("API", config.api.port),
        ("device", config.device.port),
    ] {
        if port == 0 {
            anyhow::bail!("Invalid {} port number: {}", name, port);
        }
    }

    for (name, address) in [("Modbus", &config.modbus.address), ("API", &config.api.address)] {
        if !is_valid_ip_address(address) {
            // Host names are accepted by the listeners, only warn
            warn!("Potentially invalid {} address format: {}", name, address);
        }
    }

    config.device.socket_addr()?;

    Url::parse(&config.missions.base_url).with_context(|| {
        format!(
            "Invalid mission service URL: {}",
            config.missions.base_url
        )
    })?;

    if config.missions.reset_coil_start > config.missions.reset_coil_end {
        anyhow::bail!(
            "Invalid reset coil range {}-{}",
            config.missions.reset_coil_start,
            config.missions.reset_coil_end
        );
    }

    if !config.missions.stop_path.contains("{id}") {
        anyhow::bail!(
            "Mission work stop path must contain the {{id}} placeholder: {}",
            config.missions.stop_path
        );
    }

    if config.persistence.enabled && config.persistence.interval_ms == 0 {
        anyhow::bail!("Persistence interval must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes() {
        validate_specific_rules(&Config::default()).unwrap();
    }

    #[test]
    fn oversized_bank_is_rejected() {
        let mut config = Config::default();
        config.modbus.bank_size = 65536;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn reversed_reset_range_is_rejected() {
        let mut config = Config::default();
        config.missions.reset_coil_start = 111;
        let err = validate_specific_rules(&config).unwrap_err();
        assert!(err.to_string().contains("reset coil range"));
    }

    #[test]
    fn host_name_devices_are_rejected() {
        let mut config = Config::default();
        config.device.address = "plc.local".to_string();
        assert!(validate_specific_rules(&config).is_err());
    }
}
