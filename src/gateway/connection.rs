// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Per-call connection to the remote Modbus device

use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, warn};
use tokio::time;
use tokio_modbus::{client::Context, prelude::*};

use super::GatewayError;

/// Exclusive, short-lived ownership of one socket to the remote device.
///
/// A handle is opened for a single gateway call and closed before the call
/// returns. Dropping a handle without [`close`](Self::close) still releases
/// the socket, since the underlying stream is closed when dropped.
pub struct ConnectionHandle {
    ctx: Option<Context>,
    peer: SocketAddr,
    timeout: Duration,
}

impl ConnectionHandle {
    /// Connect to the device. Failing to establish the connection within
    /// `timeout` is reported as a connection error.
    pub async fn open(
        peer: SocketAddr,
        unit_id: u8,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        debug!("Connecting to Modbus device at {}", peer);
        let ctx = match time::timeout(timeout, tcp::connect_slave(peer, Slave(unit_id))).await {
            Ok(Ok(ctx)) => ctx,
            Ok(Err(e)) => return Err(GatewayError::Connection(format!("{peer}: {e}"))),
            Err(_) => {
                return Err(GatewayError::Connection(format!(
                    "{peer}: timed out after {timeout:?}"
                )))
            }
        };
        Ok(Self {
            ctx: Some(ctx),
            peer,
            timeout,
        })
    }

    /// Issue one request and wait for its response.
    pub async fn call(&mut self, request: Request<'static>) -> Result<Response, GatewayError> {
        let operation = describe(&request);
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| GatewayError::Connection(format!("{}: connection closed", self.peer)))?;

        match time::timeout(self.timeout, ctx.call(request)).await {
            Ok(Ok(Ok(response))) => Ok(response),
            Ok(Ok(Err(exception))) => {
                warn!("Modbus device answered {} with {}", operation, exception);
                Err(GatewayError::Device {
                    operation,
                    exception,
                })
            }
            Ok(Err(e)) => Err(GatewayError::Connection(format!("{}: {}", self.peer, e))),
            Err(_) => Err(GatewayError::Connection(format!(
                "{}: no response to {} within {:?}",
                self.peer, operation, self.timeout
            ))),
        }
    }

    /// Release the connection.
    pub async fn close(mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            if let Err(e) = ctx.disconnect().await {
                debug!("Error while disconnecting from {}: {}", self.peer, e);
            }
            debug!("Disconnected from Modbus device at {}", self.peer);
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if self.ctx.is_some() {
            debug!("Connection to {} dropped without explicit close", self.peer);
        }
    }
}

/// Human readable label of a request, matching the gateway error messages.
pub(crate) fn describe(request: &Request<'_>) -> String {
    match request {
        Request::ReadDiscreteInputs(..) => "reading discrete inputs".to_string(),
        Request::ReadInputRegisters(..) => "reading input registers".to_string(),
        Request::ReadCoils(..) => "reading coils".to_string(),
        Request::ReadHoldingRegisters(..) => "reading holding registers".to_string(),
        Request::WriteSingleCoil(addr, _) => format!("writing Modbus coil {addr}"),
        Request::WriteSingleRegister(addr, _) => {
            format!("writing Modbus holding register {addr}")
        }
        other => format!("{other:?}"),
    }
}
