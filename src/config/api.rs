// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration of the HTTP API server

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP gateway API.
///
/// # Fields
///
/// * `enabled` - Flag to enable or disable the HTTP server
/// * `port` - TCP port for the HTTP server (default: 8000)
/// * `address` - Network address to bind to (default: 0.0.0.0)
/// * `name` - Server identity reported in the `Server` header
/// * `allowed_origins` - Origins accepted by the CORS fairing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub port: u16,
    pub address: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_name() -> String {
    format!("ModbusBridge/{}", env!("CARGO_PKG_VERSION"))
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://192.168.1.53:3000".to_string(),
    ]
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8000,
            address: "0.0.0.0".to_string(),
            name: default_name(),
            allowed_origins: default_allowed_origins(),
        }
    }
}
