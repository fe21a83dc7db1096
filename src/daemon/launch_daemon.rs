// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info};
use rocket::{
    config::LogLevel,
    data::{Limits, ToByteUnit},
    Shutdown,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time;

use crate::address_space::AddressSpace;
use crate::api::{build_rocket, ApiState};
use crate::config::Config;
use crate::gateway::Gateway;
use crate::missions::{MissionClient, Workflows};
use crate::modbus;
use crate::persistence::{MemoryRecordStore, RecordStore, SqliteRecordStore, Synchronizer};

/// Represents the set of services started from one configuration
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    space: Arc<AddressSpace>,
    modbus_addr: Option<SocketAddr>,
    rocket_shutdown: Option<Shutdown>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        Daemon {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            space: Arc::new(AddressSpace::default()),
            modbus_addr: None,
            rocket_shutdown: None,
        }
    }

    /// Launch all configured services
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        self.space = Arc::new(AddressSpace::new(config.modbus.bank_size));

        if config.persistence.enabled {
            self.start_persistence(config).await?;
        }

        if config.modbus.enabled {
            self.start_modbus_bridge(config).await?;
        }

        if config.api.enabled {
            self.start_web_server(config).await?;
        }

        Ok(())
    }

    /// Address space served by the slave bridge
    pub fn address_space(&self) -> Arc<AddressSpace> {
        Arc::clone(&self.space)
    }

    /// Local address of the slave bridge once started
    pub fn modbus_addr(&self) -> Option<SocketAddr> {
        self.modbus_addr
    }

    /// Open the record store, seed it and start the synchronizer.
    ///
    /// The store is initialized before the slave bridge accepts connections,
    /// so restored values are visible to the first master.
    async fn start_persistence(&mut self, config: &Config) -> Result<()> {
        let store: Arc<dyn RecordStore> = if config.persistence.is_in_memory() {
            info!("Using in-memory record store");
            Arc::new(MemoryRecordStore::new())
        } else {
            Arc::new(
                SqliteRecordStore::open(&config.persistence.database)
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to open record store {}",
                            config.persistence.database
                        )
                    })?,
            )
        };

        let synchronizer = Synchronizer::new(
            Arc::clone(&self.space),
            store,
            config.persistence.interval(),
        );
        synchronizer
            .initialize(config.persistence.restore_on_start)
            .await
            .context("Failed to initialize record store")?;

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            synchronizer.run(running).await;
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Bind the slave bridge listener and serve it until shutdown
    async fn start_modbus_bridge(&mut self, config: &Config) -> Result<()> {
        let bind = format!("{}:{}", config.modbus.address, config.modbus.port);
        let listener = TcpListener::bind(&bind)
            .await
            .with_context(|| format!("Failed to bind Modbus slave bridge on {}", bind))?;
        self.modbus_addr = Some(listener.local_addr()?);

        let space = Arc::clone(&self.space);
        let running = self.running.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                result = modbus::serve(listener, space) => {
                    if let Err(e) = &result {
                        error!("Modbus slave bridge stopped: {}", e);
                    }
                    result?;
                }
                _ = stopped(running) => {
                    info!("Modbus slave bridge stopped");
                }
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start the Rocket web server
    async fn start_web_server(&mut self, config: &Config) -> Result<()> {
        info!(
            "Starting web server on {}:{}",
            config.api.address, config.api.port
        );

        let figment = rocket::Config::figment()
            .merge(("ident", config.api.name.clone()))
            .merge(("limits", Limits::new().limit("json", 2.mebibytes())))
            .merge(("address", config.api.address.clone()))
            .merge(("port", config.api.port))
            .merge(("log_level", LogLevel::Normal));

        let gateway = Gateway::new(
            config.device.socket_addr()?,
            config.device.unit_id,
            config.device.timeout(),
        );
        debug!("Gateway targets Modbus device at {}", gateway.peer());
        let missions = MissionClient::new(&config.missions)?;
        let workflows = Workflows::new(gateway, missions, config.missions.reset_coils());

        let rocket = build_rocket(
            figment,
            ApiState::new(workflows),
            config.api.allowed_origins.clone(),
        );
        let ignited = rocket.ignite().await?;
        self.rocket_shutdown = Some(ignited.shutdown());

        let task = tokio::spawn(async move {
            ignited.launch().await?;
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
        if let Some(shutdown) = &self.rocket_shutdown {
            shutdown.clone().notify();
        }
    }

    /// Wait for all tasks to complete
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match task.await {
                Ok(Err(e)) => error!("Task failed: {}", e),
                Err(e) => error!("Task panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }
        Ok(())
    }
}

/// Resolves once `running` has been cleared
async fn stopped(running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        time::sleep(Duration::from_millis(100)).await;
    }
}
