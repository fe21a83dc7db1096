// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the Modbus bridge
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema before being deserialized.
//!
//! ## Configuration Structure
//!
//! - `modbus`: Settings for the Modbus TCP slave bridge
//! - `device`: The remote Modbus device reached by the gateway
//! - `persistence`: Settings for the persistence synchronizer
//! - `api`: Settings for the HTTP gateway API
//! - `missions`: The mission management service and workflow parameters
//!
//! ## Usage
//!
//! ```no_run
//! use rust_modbus_bridge::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some(8001),                     // API port
//!     Some("0.0.0.0".to_string()),    // API address
//!     Some(true),                     // Enable Modbus
//!     None,                           // Modbus address
//!     Some(5021),                     // Modbus port
//!     None,                           // Device address
//!     None,                           // Device port
//!     Some("bridge.db".to_string()),  // Database
//!     None,                           // Mission service URL
//! );
//!
//! println!("API port: {}", config.api.port);
//! ```

pub mod api;
pub mod device;
pub mod missions;
pub mod modbus;
pub mod persistence;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use api::ApiConfig;
pub use device::DeviceConfig;
pub use missions::MissionsConfig;
pub use modbus::ModbusConfig;
pub use persistence::{PersistenceConfig, MEMORY_DATABASE};
pub use utils::{is_valid_ip_address, output_config_schema};

/// JSON schema every configuration file is validated against.
pub const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure.
///
/// Every section falls back to its default values when missing from the
/// file, so an empty document is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Modbus TCP slave bridge serving the shared address space
    #[serde(default)]
    pub modbus: ModbusConfig,

    /// Remote device the gateway forwards HTTP requests to
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// HTTP server exposing the gateway and the workflows
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub missions: MissionsConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // An empty document parses as null, which stands for all defaults
        let json_value = match serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })? {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value => value,
        };

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_json::from_value(json_value) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only arguments that were provided override the loaded values.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_args(
        &mut self,
        api_port: Option<u16>,
        api_address: Option<String>,
        modbus_enabled: Option<bool>,
        modbus_address: Option<String>,
        modbus_port: Option<u16>,
        device_address: Option<String>,
        device_port: Option<u16>,
        database: Option<String>,
        missions_url: Option<String>,
    ) {
        if let Some(port) = api_port {
            debug!("Overriding API port from command line: {}", port);
            self.api.port = port;
        }
        if let Some(address) = api_address {
            debug!("Overriding API address from command line: {}", address);
            self.api.address = address;
        }

        if let Some(enabled) = modbus_enabled {
            debug!("Overriding Modbus enabled from command line: {}", enabled);
            self.modbus.enabled = enabled;
        }
        if let Some(address) = modbus_address {
            debug!("Overriding Modbus address from command line: {}", address);
            self.modbus.address = address;
        }
        if let Some(port) = modbus_port {
            debug!("Overriding Modbus port from command line: {}", port);
            self.modbus.port = port;
        }

        if let Some(address) = device_address {
            debug!("Overriding device address from command line: {}", address);
            self.device.address = address;
        }
        if let Some(port) = device_port {
            debug!("Overriding device port from command line: {}", port);
            self.device.port = port;
        }

        if let Some(database) = database {
            debug!("Overriding database from command line: {}", database);
            self.persistence.database = database;
        }
        if let Some(url) = missions_url {
            debug!("Overriding mission service URL from command line: {}", url);
            self.missions.base_url = url;
        }
    }
}
