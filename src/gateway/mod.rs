// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Gateway to the remote Modbus device
//!
//! The [`Gateway`] issues reads and writes against a single remote Modbus TCP
//! device on behalf of HTTP callers. Every public operation:
//!
//! 1. opens its own [`ConnectionHandle`] (a failed or timed out connect is a
//!    [`GatewayError::Connection`]),
//! 2. performs its read/write primitives on that handle,
//! 3. closes the handle, whatever the outcome.
//!
//! Handles are never pooled nor shared between concurrent calls, so
//! responses from devices that do not support request pipelining can never
//! interleave.
//!
//! The aggregate [`Gateway::read_all`] reads up to five logical banks on one
//! handle. It is strict: any failure aborts the whole call.

pub mod connection;

pub use connection::ConnectionHandle;

use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, error};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_modbus::prelude::*;

use crate::address_space::BankKind;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The device could not be reached or stopped answering
    #[error("Could not connect to Modbus server: {0}")]
    Connection(String),

    /// The device answered with a Modbus exception response
    #[error("Error {operation}: {exception}")]
    Device {
        operation: String,
        exception: ExceptionCode,
    },

    /// The device answered, but not with what was asked for
    #[error("Invalid response from Modbus server for {bank}: {detail}")]
    InvalidResponse { bank: BankKind, detail: String },
}

/// `(start, count)` pair for one bank
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRange {
    pub start: u16,
    pub count: u16,
}

impl BankRange {
    pub fn new(start: u16, count: u16) -> Self {
        Self { start, count }
    }
}

/// One range per logical bank for [`Gateway::read_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadAllRanges {
    pub discrete_inputs: BankRange,
    pub input_registers: BankRange,
    pub coils: BankRange,
    pub holding_registers: BankRange,
    pub indicators: BankRange,
}

impl ReadAllRanges {
    pub fn range(&self, kind: BankKind) -> BankRange {
        match kind {
            BankKind::DiscreteInput => self.discrete_inputs,
            BankKind::InputRegister => self.input_registers,
            BankKind::Coil => self.coils,
            BankKind::HoldingRegister => self.holding_registers,
            BankKind::Indicator => self.indicators,
        }
    }
}

/// Values of all five banks. A bank requested with a count of 0 is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadAllResult {
    pub discrete_inputs: Vec<bool>,
    pub input_registers: Vec<u16>,
    pub coils: Vec<bool>,
    pub holding_registers: Vec<u16>,
    pub indicators: Vec<bool>,
}

/// Values read from one bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BankValues {
    Bits(Vec<bool>),
    Words(Vec<u16>),
}

impl BankValues {
    fn empty(kind: BankKind) -> Self {
        if kind.is_bit() {
            BankValues::Bits(Vec::new())
        } else {
            BankValues::Words(Vec::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BankValues::Bits(v) => v.len(),
            BankValues::Words(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bits(self) -> Vec<bool> {
        match self {
            BankValues::Bits(v) => v,
            BankValues::Words(_) => Vec::new(),
        }
    }

    pub fn into_words(self) -> Vec<u16> {
        match self {
            BankValues::Words(v) => v,
            BankValues::Bits(_) => Vec::new(),
        }
    }
}

/// Client side of the bridge, talking to one remote Modbus device.
#[derive(Debug, Clone)]
pub struct Gateway {
    peer: SocketAddr,
    unit_id: u8,
    timeout: Duration,
}

impl Gateway {
    pub fn new(peer: SocketAddr, unit_id: u8, timeout: Duration) -> Self {
        Self {
            peer,
            unit_id,
            timeout,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Open a handle, run `requests` in order and release the handle.
    ///
    /// The first failing request aborts the remaining ones. With no request
    /// at all this only checks that the device accepts connections.
    async fn transact(
        &self,
        requests: Vec<Request<'static>>,
    ) -> Result<Vec<Response>, GatewayError> {
        let mut handle = ConnectionHandle::open(self.peer, self.unit_id, self.timeout)
            .await
            .inspect_err(|e| error!("{}", e))?;

        let mut responses = Vec::with_capacity(requests.len());
        let mut outcome = Ok(());
        for request in requests {
            match handle.call(request).await {
                Ok(response) => responses.push(response),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        handle.close().await;

        outcome.map(|()| responses)
    }

    /// Read `count` values of one logical bank starting at `start`.
    pub async fn read_bank(
        &self,
        kind: BankKind,
        start: u16,
        count: u16,
    ) -> Result<BankValues, GatewayError> {
        let request = read_request(kind, BankRange::new(start, count));
        let mut responses = self.transact(request.into_iter().collect()).await?;
        match responses.pop() {
            Some(response) => values_from(kind, count, response),
            None => Ok(BankValues::empty(kind)),
        }
    }

    /// Write one coil on the device.
    pub async fn write_coil(&self, address: u16, value: bool) -> Result<(), GatewayError> {
        debug!("Writing {} to remote coil {}", value, address);
        self.transact(vec![Request::WriteSingleCoil(address, value)])
            .await
            .map(|_| ())
    }

    /// Write one holding register on the device.
    pub async fn write_register(&self, address: u16, value: u16) -> Result<(), GatewayError> {
        debug!("Writing {} to remote holding register {}", value, address);
        self.transact(vec![Request::WriteSingleRegister(address, value)])
            .await
            .map(|_| ())
    }

    /// Read the five logical banks over a single connection.
    ///
    /// Banks requested with a count of 0 are not read and come back empty,
    /// but the connection is opened even when every count is 0.
    pub async fn read_all(&self, ranges: ReadAllRanges) -> Result<ReadAllResult, GatewayError> {
        let wanted: Vec<BankKind> = BankKind::ALL
            .into_iter()
            .filter(|kind| ranges.range(*kind).count > 0)
            .collect();
        let requests = wanted
            .iter()
            .filter_map(|kind| read_request(*kind, ranges.range(*kind)))
            .collect();

        let responses = self.transact(requests).await?;

        let mut result = ReadAllResult::default();
        for (kind, response) in wanted.into_iter().zip(responses) {
            let values = values_from(kind, ranges.range(kind).count, response)?;
            match kind {
                BankKind::DiscreteInput => result.discrete_inputs = values.into_bits(),
                BankKind::InputRegister => result.input_registers = values.into_words(),
                BankKind::Coil => result.coils = values.into_bits(),
                BankKind::HoldingRegister => result.holding_registers = values.into_words(),
                BankKind::Indicator => result.indicators = values.into_bits(),
            }
        }
        Ok(result)
    }
}

/// Read request for a bank, `None` when nothing has to be read.
fn read_request(kind: BankKind, range: BankRange) -> Option<Request<'static>> {
    if range.count == 0 {
        return None;
    }
    let BankRange { start, count } = range;
    Some(match kind {
        BankKind::DiscreteInput => Request::ReadDiscreteInputs(start, count),
        BankKind::InputRegister => Request::ReadInputRegisters(start, count),
        BankKind::HoldingRegister => Request::ReadHoldingRegisters(start, count),
        BankKind::Coil | BankKind::Indicator => Request::ReadCoils(start, count),
    })
}

/// Extract the values of a read response.
///
/// Bit responses are padded to whole bytes on the wire and are cut back to
/// the requested count.
fn values_from(kind: BankKind, count: u16, response: Response) -> Result<BankValues, GatewayError> {
    let count = usize::from(count);
    let short = |got: usize| GatewayError::InvalidResponse {
        bank: kind,
        detail: format!("expected {count} values, got {got}"),
    };
    match response {
        Response::ReadCoils(mut bits) | Response::ReadDiscreteInputs(mut bits) => {
            if bits.len() < count {
                return Err(short(bits.len()));
            }
            bits.truncate(count);
            Ok(BankValues::Bits(bits))
        }
        Response::ReadInputRegisters(words) | Response::ReadHoldingRegisters(words) => {
            if words.len() < count {
                return Err(short(words.len()));
            }
            Ok(BankValues::Words(words))
        }
        other => Err(GatewayError::InvalidResponse {
            bank: kind,
            detail: format!("unexpected {other:?}"),
        }),
    }
}
