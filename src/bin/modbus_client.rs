// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use rust_modbus_bridge::address_space::BankKind;
use rust_modbus_bridge::gateway::{BankValues, Gateway};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Bank {
    DiscreteInputs,
    InputRegisters,
    Coils,
    HoldingRegisters,
    Indicators,
}

impl From<Bank> for BankKind {
    fn from(bank: Bank) -> Self {
        match bank {
            Bank::DiscreteInputs => BankKind::DiscreteInput,
            Bank::InputRegisters => BankKind::InputRegister,
            Bank::Coils => BankKind::Coil,
            Bank::HoldingRegisters => BankKind::HoldingRegister,
            Bank::Indicators => BankKind::Indicator,
        }
    }
}

/// Read one bank of a Modbus device through the bridge gateway
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Modbus server address
    #[clap(long, default_value = "127.0.0.1")]
    address: String,

    /// Modbus server port
    #[clap(long, default_value = "5020")]
    port: u16,

    /// Unit identifier
    #[clap(long, default_value = "1")]
    unit_id: u8,

    /// Bank to read
    #[clap(long, value_enum, default_value = "holding-registers")]
    bank: Bank,

    /// Starting address
    #[clap(long, default_value = "0")]
    start: u16,

    /// Number of values to read
    #[clap(long, default_value = "10")]
    count: u16,

    /// Request timeout in milliseconds
    #[clap(long, default_value = "1000")]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();

    let peer: SocketAddr = format!("{}:{}", args.address, args.port).parse()?;
    println!("Connecting to Modbus server at {}", peer);

    let gateway = Gateway::new(peer, args.unit_id, Duration::from_millis(args.timeout_ms));
    let kind = BankKind::from(args.bank);

    println!(
        "Reading {} {} starting at address {}",
        args.count, kind, args.start
    );
    let values = gateway.read_bank(kind, args.start, args.count).await?;

    match values {
        BankValues::Bits(bits) => {
            for (offset, value) in bits.into_iter().enumerate() {
                let address = usize::from(args.start) + offset;
                println!("{} {}: {}", kind, address, value);
            }
        }
        BankValues::Words(words) => {
            for (offset, value) in words.into_iter().enumerate() {
                let address = usize::from(args.start) + offset;
                println!("{} {}: {} (0x{:04X})", kind, address, value, value);
            }
        }
    }

    Ok(())
}
