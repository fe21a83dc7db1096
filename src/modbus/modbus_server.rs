// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus slave bridge
//!
//! For avoiding confusion with the Modbus master/slave terminology, `tokio-modbus`
//! uses the terms "server" and "client" instead. The server is the device that
//! provides data, while the client is the device that requests data. In other
//! words, the Modbus master is here the client and the Modbus slave is here the
//! server.
//!
//! Every accepted connection gets its own [`SlaveService`], all of them sharing
//! the same [`AddressSpace`]. Requests are independent: there is no retry and a
//! failing request only produces an exception response for that request.

use std::{future, io, net::SocketAddr, sync::Arc};

use log::{debug, error, info};
use tokio::net::TcpListener;
use tokio_modbus::{
    prelude::*,
    server::tcp::{accept_tcp_connection, Server},
};

use crate::address_space::{AddressSpace, AddressSpaceError, BankKind};

/// Identification strings of the emulated slave
pub const VENDOR_NAME: &str = "ModbusSim";
pub const PRODUCT_CODE: &str = "MS";
pub const PRODUCT_NAME: &str = "Modbus Simulator";
pub const MODEL_NAME: &str = "ModbusSim";
pub const REVISION: &str = "1.0";

/// Modbus service answering requests from one master connection against the
/// shared address space.
///
/// Supported function codes:
/// - 0x01: Read Coils
/// - 0x02: Read Discrete Inputs
/// - 0x03: Read Holding Registers
/// - 0x04: Read Input Registers
/// - 0x05: Write Single Coil
/// - 0x06: Write Single Register
///
/// Any other function code is answered with an `IllegalFunction` exception.
#[derive(Debug, Clone)]
pub struct SlaveService {
    space: Arc<AddressSpace>,
}

impl SlaveService {
    pub fn new(space: Arc<AddressSpace>) -> Self {
        Self { space }
    }

    /// Route one request to the address space.
    pub fn handle(&self, req: Request<'_>) -> Result<Response, ExceptionCode> {
        match req {
            Request::ReadCoils(addr, cnt) => {
                debug!("Reading {} coils starting from address {}", cnt, addr);
                self.space
                    .read_bits(BankKind::Coil, addr, cnt)
                    .map(Response::ReadCoils)
                    .map_err(exception)
            }
            Request::ReadDiscreteInputs(addr, cnt) => {
                debug!(
                    "Reading {} discrete inputs starting from address {}",
                    cnt, addr
                );
                self.space
                    .read_bits(BankKind::DiscreteInput, addr, cnt)
                    .map(Response::ReadDiscreteInputs)
                    .map_err(exception)
            }
            Request::ReadHoldingRegisters(addr, cnt) => {
                debug!(
                    "Reading {} holding registers starting from address {}",
                    cnt, addr
                );
                self.space
                    .read_words(BankKind::HoldingRegister, addr, cnt)
                    .map(Response::ReadHoldingRegisters)
                    .map_err(exception)
            }
            Request::ReadInputRegisters(addr, cnt) => {
                debug!(
                    "Reading {} input registers starting from address {}",
                    cnt, addr
                );
                self.space
                    .read_words(BankKind::InputRegister, addr, cnt)
                    .map(Response::ReadInputRegisters)
                    .map_err(exception)
            }
            Request::WriteSingleCoil(addr, value) => {
                debug!("Writing {} to coil {}", value, addr);
                self.space
                    .write_bit(BankKind::Coil, addr, value)
                    .map(|_| Response::WriteSingleCoil(addr, value))
                    .map_err(exception)
            }
            Request::WriteSingleRegister(addr, value) => {
                debug!("Writing value {} to holding register {}", value, addr);
                self.space
                    .write_word(BankKind::HoldingRegister, addr, value)
                    .map(|_| Response::WriteSingleRegister(addr, value))
                    .map_err(exception)
            }
            _ => {
                error!(
                    "Exception::IllegalFunction - Unimplemented function code in request: {req:?}"
                );
                Err(ExceptionCode::IllegalFunction)
            }
        }
    }
}

impl tokio_modbus::server::Service for SlaveService {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        debug!("Received Modbus request: {:?}", req);
        let res = self.handle(req);
        if let Err(e) = &res {
            error!("Modbus request error: {:?}", e);
        }
        future::ready(res)
    }
}

fn exception(err: AddressSpaceError) -> ExceptionCode {
    error!("Address space rejected request: {}", err);
    match err {
        AddressSpaceError::Range { .. } => ExceptionCode::IllegalDataAddress,
        AddressSpaceError::Type { .. } => ExceptionCode::IllegalDataValue,
    }
}

/// Serve the address space on an already bound listener until the listener
/// fails or the surrounding task is aborted.
pub async fn serve(listener: TcpListener, space: Arc<AddressSpace>) -> io::Result<()> {
    let local_addr = listener.local_addr()?;
    info!(
        "{} ({} {}/{} rev {}) listening on {}",
        PRODUCT_NAME, VENDOR_NAME, MODEL_NAME, PRODUCT_CODE, REVISION, local_addr
    );

    let server = Server::new(listener);
    let on_connected = move |stream, socket_addr: SocketAddr| {
        let space = Arc::clone(&space);
        async move {
            debug!("Modbus master connected from {}", socket_addr);
            accept_tcp_connection(stream, socket_addr, move |_socket_addr| {
                Ok(Some(SlaveService::new(Arc::clone(&space))))
            })
        }
    };
    let on_process_error = |err| {
        error!("Modbus server error: {err}");
    };

    server.serve(&on_connected, on_process_error).await?;
    Ok(())
}
