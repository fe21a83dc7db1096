// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Remote Modbus device reached by the gateway

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// IP address of the remote device
    pub address: String,

    /// Modbus TCP port of the remote device
    pub port: u16,

    /// Unit identifier sent with every request
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,

    /// Connect and response timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_unit_id() -> u8 {
    1
}

fn default_timeout_ms() -> u64 {
    3000
}

impl DeviceConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.address, self.port)
            .parse()
            .with_context(|| format!("Invalid device address {}:{}", self.address, self.port))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: "192.168.1.96".to_string(),
            port: 3001,
            unit_id: default_unit_id(),
            timeout_ms: default_timeout_ms(),
        }
    }
}
