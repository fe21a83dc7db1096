// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus communication module
//!
//! This module provides the Modbus TCP slave bridge, exposing the shared
//! [`AddressSpace`](crate::address_space::AddressSpace) to external Modbus
//! masters.
//!
//! ## Key Components
//!
//! - `SlaveService`: per-connection request handler routing reads and writes
//!   to the address space.
//! - `serve`: accept loop binding a `SlaveService` to every new connection.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_modbus_bridge::{address_space::AddressSpace, modbus};
//! use tokio::net::TcpListener;
//!
//! # async fn run() -> std::io::Result<()> {
//! let space = Arc::new(AddressSpace::default());
//! let listener = TcpListener::bind("127.0.0.1:5020").await?;
//! modbus::serve(listener, space).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Address Map
//!
//! Every bank holds `bank_size` cells (1000 by default) starting at address 0:
//!
//! | Bank | Function codes | Access |
//! |------|----------------|--------|
//! | Coils | 0x01, 0x05 | read/write |
//! | Discrete inputs | 0x02 | read |
//! | Holding registers | 0x03, 0x06 | read/write |
//! | Input registers | 0x04 | read |

pub mod modbus_server;
pub use modbus_server::{serve, SlaveService};
