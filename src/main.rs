// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the Modbus bridge daemon
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use rust_modbus_bridge::config::{output_config_schema, Config};
use rust_modbus_bridge::daemon::Daemon;

/// Modbus TCP bridge with persistence and HTTP gateway
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file, created with defaults if missing
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// HTTP API port
    #[arg(short = 'p', long)]
    api_port: Option<u16>,

    /// HTTP API address
    #[arg(short = 'a', long)]
    api_address: Option<String>,

    /// Enable or disable the Modbus slave bridge
    #[arg(long)]
    modbus_enabled: Option<bool>,

    /// Modbus slave bridge address
    #[arg(long)]
    modbus_address: Option<String>,

    /// Modbus slave bridge port
    #[arg(long)]
    modbus_port: Option<u16>,

    /// Address of the remote Modbus device reached by the gateway
    #[arg(long)]
    device_address: Option<String>,

    /// Port of the remote Modbus device
    #[arg(long)]
    device_port: Option<u16>,

    /// SQLite database of the persistence synchronizer, or :memory:
    #[arg(long)]
    database: Option<String>,

    /// Base URL of the mission management service
    #[arg(long)]
    missions_url: Option<String>,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    show_config_schema: bool,
}

#[rocket::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );
    let args = Args::parse();

    if args.show_config_schema {
        return output_config_schema();
    }

    let mut config = Config::from_file(&args.config)?;
    config.apply_args(
        args.api_port,
        args.api_address,
        args.modbus_enabled,
        args.modbus_address,
        args.modbus_port,
        args.device_address,
        args.device_port,
        args.database,
        args.missions_url,
    );

    let mut daemon = Daemon::new();
    daemon.launch(&config).await?;
    info!("Modbus bridge running, press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    daemon.shutdown();
    daemon.join().await?;
    info!("Modbus bridge stopped");

    Ok(())
}
