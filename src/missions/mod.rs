// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mission management service integration
//!
//! Mission works and vehicles are owned by an external REST service. This
//! module holds the client for that service and the orchestration workflows
//! that combine it with coil writes on the remote Modbus device.

pub mod client;
pub mod workflows;

pub use client::MissionClient;
pub use workflows::{
    StepError, StepOutcome, StepPolicy, StopAllReport, WorkflowError, WorkflowReport,
    WorkflowState, Workflows,
};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a mission work, numeric or textual depending on the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MissionWorkId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MissionWorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionWorkId::Number(n) => write!(f, "{n}"),
            MissionWorkId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    Running,
    Paused,
    Stopped,
    #[serde(other)]
    Other,
}

/// Mission work as listed by the mission service. Fields other than `id`
/// and `status` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionWork {
    pub id: MissionWorkId,
    pub status: MissionStatus,
}

impl MissionWork {
    /// Only running or paused mission works are stopped.
    pub fn is_stoppable(&self) -> bool {
        matches!(self.status, MissionStatus::Running | MissionStatus::Paused)
    }
}

/// Failure of a call to the mission service
#[derive(Debug, Error)]
pub enum MissionError {
    #[error("Failed to {operation}, status code: {status}")]
    Status { operation: String, status: u16 },

    #[error("Failed to {operation}: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid mission service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Mission service URL cannot carry a path: {0}")]
    BaseUrl(String),
}
