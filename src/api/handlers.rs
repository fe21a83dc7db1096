// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Route handlers of the HTTP gateway API

use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::address_space::BankKind;
use crate::gateway::{BankRange, ReadAllRanges, ReadAllResult};
use crate::missions::StopAllReport;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoilRequest {
    pub address: u16,
    pub value: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub address: u16,
    pub value: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscreteInputsResponse {
    pub discrete_inputs: Vec<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InputRegistersResponse {
    pub input_registers: Vec<u16>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoilsResponse {
    pub coils: Vec<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HoldingRegistersResponse {
    pub holding_registers: Vec<u16>,
}

/// Read the five logical banks of the device in one connection.
#[allow(clippy::too_many_arguments)]
#[get("/readAll?<discrete_start>&<discrete_count>&<input_start>&<input_count>&<coil_start>&<coil_count>&<holding_start>&<holding_count>&<indicator_start>&<indicator_count>")]
pub async fn read_all(
    state: &State<ApiState>,
    discrete_start: u16,
    discrete_count: u16,
    input_start: u16,
    input_count: u16,
    coil_start: u16,
    coil_count: u16,
    holding_start: u16,
    holding_count: u16,
    indicator_start: u16,
    indicator_count: u16,
) -> ApiResult<ReadAllResult> {
    let ranges = ReadAllRanges {
        discrete_inputs: BankRange::new(discrete_start, discrete_count),
        input_registers: BankRange::new(input_start, input_count),
        coils: BankRange::new(coil_start, coil_count),
        holding_registers: BankRange::new(holding_start, holding_count),
        indicators: BankRange::new(indicator_start, indicator_count),
    };
    Ok(Json(state.gateway.read_all(ranges).await?))
}

#[get("/readDiscreteInputs?<start>&<count>")]
pub async fn read_discrete_inputs(
    state: &State<ApiState>,
    start: u16,
    count: u16,
) -> ApiResult<DiscreteInputsResponse> {
    let values = state
        .gateway
        .read_bank(BankKind::DiscreteInput, start, count)
        .await?;
    Ok(Json(DiscreteInputsResponse {
        discrete_inputs: values.into_bits(),
    }))
}

#[get("/readInputRegisters?<start>&<count>")]
pub async fn read_input_registers(
    state: &State<ApiState>,
    start: u16,
    count: u16,
) -> ApiResult<InputRegistersResponse> {
    let values = state
        .gateway
        .read_bank(BankKind::InputRegister, start, count)
        .await?;
    Ok(Json(InputRegistersResponse {
        input_registers: values.into_words(),
    }))
}

#[get("/readCoils?<start>&<count>")]
pub async fn read_coils(state: &State<ApiState>, start: u16, count: u16) -> ApiResult<CoilsResponse> {
    let values = state.gateway.read_bank(BankKind::Coil, start, count).await?;
    Ok(Json(CoilsResponse {
        coils: values.into_bits(),
    }))
}

#[get("/readHoldingRegisters?<start>&<count>")]
pub async fn read_holding_registers(
    state: &State<ApiState>,
    start: u16,
    count: u16,
) -> ApiResult<HoldingRegistersResponse> {
    let values = state
        .gateway
        .read_bank(BankKind::HoldingRegister, start, count)
        .await?;
    Ok(Json(HoldingRegistersResponse {
        holding_registers: values.into_words(),
    }))
}

#[post("/writeCoil", format = "json", data = "<request>")]
pub async fn write_coil(
    state: &State<ApiState>,
    request: Json<CoilRequest>,
) -> ApiResult<SuccessResponse> {
    state
        .gateway
        .write_coil(request.address, request.value)
        .await?;
    Ok(SuccessResponse::ok())
}

#[post("/writeHoldingRegister", format = "json", data = "<request>")]
pub async fn write_holding_register(
    state: &State<ApiState>,
    request: Json<RegisterRequest>,
) -> ApiResult<SuccessResponse> {
    state
        .gateway
        .write_register(request.address, request.value)
        .await?;
    Ok(SuccessResponse::ok())
}

/// Reset the mission coils and stop every running or paused mission work.
#[post("/stopAll")]
pub async fn stop_all_mission_works(state: &State<ApiState>) -> ApiResult<StopAllReport> {
    Ok(Json(state.workflows.stop_all_mission_works().await?))
}

#[post("/emergencyStop")]
pub async fn emergency_stop(state: &State<ApiState>) -> ApiResult<SuccessResponse> {
    state.workflows.emergency_stop().await?;
    Ok(SuccessResponse::ok())
}
