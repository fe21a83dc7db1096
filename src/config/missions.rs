// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mission management service configuration

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Location of the mission service and the parameters of the orchestration
/// workflows.
///
/// Endpoint paths are appended to the path of `base_url`, so a service
/// behind a prefix such as `http://host/fleet` is reached at
/// `http://host/fleet/api/v3/...`. In `stop_path` the `{id}` placeholder is
/// replaced by the percent-encoded mission work identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionsConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// First coil turned off by the stop-all workflow
    pub reset_coil_start: u16,
    /// Last coil turned off by the stop-all workflow, inclusive
    pub reset_coil_end: u16,

    pub mission_works_path: String,
    pub stop_path: String,
    pub emergency_stop_path: String,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl MissionsConfig {
    pub fn reset_coils(&self) -> RangeInclusive<u16> {
        self.reset_coil_start..=self.reset_coil_end
    }
}

impl Default for MissionsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.1.96:8080".to_string(),
            timeout_ms: default_timeout_ms(),
            reset_coil_start: 100,
            reset_coil_end: 110,
            mission_works_path: "/api/v3/missionWorks".to_string(),
            stop_path: "/api/v3/missionWorks/{id}/controls/stop".to_string(),
            emergency_stop_path: "/api/v3/vehicles/devices/emergencyStop/open".to_string(),
        }
    }
}
