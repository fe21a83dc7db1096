// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration of the Modbus TCP slave bridge

use serde::{Deserialize, Serialize};

use crate::address_space::AddressSpace;

/// Configuration for the Modbus TCP slave bridge.
///
/// The bridge exposes the shared address space to Modbus masters.
///
/// # Example
///
/// ```
/// use rust_modbus_bridge::config::ModbusConfig;
///
/// let modbus_config = ModbusConfig {
///     enabled: true,
///     port: 5020,
///     address: "0.0.0.0".to_string(),
///     bank_size: 1000,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusConfig {
    /// Enable or disable the Modbus TCP slave bridge. Default is `true`.
    pub enabled: bool,

    /// The TCP port the slave bridge listens on. Default is 5020.
    pub port: u16,

    /// The network address the slave bridge binds to. Default is "127.0.0.1".
    pub address: String,

    /// Number of cells in each of the four banks, addresses `0..bank_size`.
    ///
    /// Valid range is 1-65535. Default is 1000.
    #[serde(default = "default_bank_size")]
    pub bank_size: usize,
}

fn default_bank_size() -> usize {
    AddressSpace::DEFAULT_BANK_SIZE
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 5020,
            address: "127.0.0.1".to_string(),
            bank_size: AddressSpace::DEFAULT_BANK_SIZE,
        }
    }
}
