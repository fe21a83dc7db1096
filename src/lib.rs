// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Modbus bridge library
//!
//! A Modbus TCP slave serving a shared in-memory address space, a synchronizer
//! mirroring its coils and holding registers to a record store, and an HTTP
//! gateway forwarding reads, writes and mission workflows to a remote Modbus
//! device.

pub mod address_space;
pub mod api;
pub mod config;
pub mod daemon;
pub mod gateway;
pub mod missions;
pub mod modbus;
pub mod persistence;
