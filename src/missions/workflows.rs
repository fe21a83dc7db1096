// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Orchestration workflows
//!
//! A workflow is an ordered list of steps, each carrying a [`StepPolicy`]:
//!
//! * `AbortOnError`: a failure ends the workflow in the `Failed` state and the
//!   remaining steps are not run.
//! * `ContinueOnError`: a failure is logged and recorded in the report, the
//!   next step runs anyway.
//!
//! Workflows go `Idle → Running → Completed | Failed` within a single call.
//! Progress is not persisted and nothing is rolled back: side effects of the
//! steps that already ran (coils written, stop requests sent) stay applied.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use thiserror::Error;

use super::{MissionClient, MissionError, MissionWorkId};
use crate::gateway::{Gateway, GatewayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    AbortOnError,
    ContinueOnError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Result of one executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: String,
    pub policy: StepPolicy,
    /// `None` when the step succeeded
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    ExternalService(#[from] MissionError),
}

/// A step with the `AbortOnError` policy failed.
#[derive(Debug, Error)]
#[error("{workflow} aborted at step '{step}': {source}")]
pub struct WorkflowError {
    pub workflow: &'static str,
    pub step: String,
    #[source]
    pub source: StepError,
}

/// Report of a completed workflow
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub workflow: &'static str,
    pub state: WorkflowState,
    pub steps: Vec<StepOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Report of [`Workflows::stop_all_mission_works`]
#[derive(Debug, Clone, Serialize)]
pub struct StopAllReport {
    pub success: bool,
    /// Every mission work a stop request was issued for
    pub stopped_mission_works: Vec<MissionWorkId>,
    /// Subset of `stopped_mission_works` whose stop request failed
    pub failed_mission_works: Vec<MissionWorkId>,
    #[serde(skip)]
    pub report: WorkflowReport,
}

impl StopAllReport {
    /// Whether some stop requests failed while the workflow still completed
    pub fn is_partial_failure(&self) -> bool {
        !self.failed_mission_works.is_empty()
    }
}

/// Execution record of one workflow call
struct WorkflowRun {
    workflow: &'static str,
    state: WorkflowState,
    steps: Vec<StepOutcome>,
    started_at: DateTime<Utc>,
}

impl WorkflowRun {
    fn start(workflow: &'static str) -> Self {
        let mut run = Self {
            workflow,
            state: WorkflowState::Idle,
            steps: Vec::new(),
            started_at: Utc::now(),
        };
        info!("Starting workflow {}", workflow);
        run.state = WorkflowState::Running;
        run
    }

    /// Record the result of a step and apply its policy.
    ///
    /// Returns `Ok(None)` for a tolerated failure.
    fn step<T, E>(
        &mut self,
        step: impl fmt::Display,
        policy: StepPolicy,
        result: Result<T, E>,
    ) -> Result<Option<T>, WorkflowError>
    where
        E: Into<StepError>,
    {
        let step = step.to_string();
        match result {
            Ok(value) => {
                self.steps.push(StepOutcome {
                    step,
                    policy,
                    error: None,
                });
                Ok(Some(value))
            }
            Err(e) => {
                let source = e.into();
                self.steps.push(StepOutcome {
                    step: step.clone(),
                    policy,
                    error: Some(source.to_string()),
                });
                match policy {
                    StepPolicy::ContinueOnError => {
                        warn!("{}: step '{}' failed, continuing: {}", self.workflow, step, source);
                        Ok(None)
                    }
                    StepPolicy::AbortOnError => {
                        self.state = WorkflowState::Failed;
                        error!("{}: step '{}' failed, aborting: {}", self.workflow, step, source);
                        Err(WorkflowError {
                            workflow: self.workflow,
                            step,
                            source,
                        })
                    }
                }
            }
        }
    }

    fn finish(mut self) -> WorkflowReport {
        self.state = WorkflowState::Completed;
        let failed = self.steps.iter().filter(|s| !s.succeeded()).count();
        info!(
            "Workflow {} completed ({} steps, {} tolerated failures)",
            self.workflow,
            self.steps.len(),
            failed
        );
        WorkflowReport {
            workflow: self.workflow,
            state: self.state,
            steps: self.steps,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Workflows combining coil writes on the remote device with calls to the
/// mission service.
#[derive(Debug, Clone)]
pub struct Workflows {
    gateway: Gateway,
    missions: MissionClient,
    reset_coils: RangeInclusive<u16>,
}

impl Workflows {
    pub fn new(gateway: Gateway, missions: MissionClient, reset_coils: RangeInclusive<u16>) -> Self {
        Self {
            gateway,
            missions,
            reset_coils,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Turn off the reset coils, then stop every running or paused mission
    /// work.
    ///
    /// Coil writes and the mission work listing abort the workflow on
    /// failure. Individual stop requests do not: the report lists every
    /// targeted mission work, and separately those whose stop failed.
    pub async fn stop_all_mission_works(&self) -> Result<StopAllReport, WorkflowError> {
        let mut run = WorkflowRun::start("stop_all_mission_works");

        for address in self.reset_coils.clone() {
            let result = self.gateway.write_coil(address, false).await;
            run.step(
                format_args!("reset coil {address}"),
                StepPolicy::AbortOnError,
                result,
            )?;
        }

        let result = self.missions.list_mission_works().await;
        let works = run
            .step("list mission works", StepPolicy::AbortOnError, result)?
            .unwrap_or_default();

        let mut targeted = Vec::new();
        let mut failed = Vec::new();
        for work in works.into_iter().filter(|w| w.is_stoppable()) {
            let result = self.missions.stop_mission_work(&work.id).await;
            if run
                .step(
                    format_args!("stop mission work {}", work.id),
                    StepPolicy::ContinueOnError,
                    result,
                )?
                .is_none()
            {
                failed.push(work.id.clone());
            }
            targeted.push(work.id);
        }

        Ok(StopAllReport {
            success: true,
            stopped_mission_works: targeted,
            failed_mission_works: failed,
            report: run.finish(),
        })
    }

    /// Trigger the vehicles emergency stop.
    pub async fn emergency_stop(&self) -> Result<WorkflowReport, WorkflowError> {
        let mut run = WorkflowRun::start("emergency_stop");
        let result = self.missions.emergency_stop().await;
        run.step("open emergency stop", StepPolicy::AbortOnError, result)?;
        Ok(run.finish())
    }
}
