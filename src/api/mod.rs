// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP gateway API
//!
//! Rocket server exposing the [`Gateway`](crate::gateway::Gateway) reads
//! and writes and the orchestration workflows. Every failure is answered
//! with `500 {"detail": "<message>"}`.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::build_rocket;

use crate::gateway::Gateway;
use crate::missions::Workflows;

/// State shared by every request handler
#[derive(Debug, Clone)]
pub struct ApiState {
    pub gateway: Gateway,
    pub workflows: Workflows,
}

impl ApiState {
    pub fn new(workflows: Workflows) -> Self {
        Self {
            gateway: workflows.gateway().clone(),
            workflows,
        }
    }
}
