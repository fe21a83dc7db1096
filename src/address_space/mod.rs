// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! In-memory Modbus address space
//!
//! The [`AddressSpace`] owns one fixed-length bank per Modbus data kind and is
//! the single authoritative copy of the slave state. It is shared (behind an
//! `Arc`) between the Modbus slave bridge, which reads and writes it on behalf
//! of remote masters, and the persistence synchronizer, which periodically
//! snapshots it.
//!
//! ## Locking
//!
//! Each bank sits behind its own reader/writer lock. Any number of readers may
//! hold a bank concurrently, a write excludes every reader of that bank, so a
//! bulk read never observes a torn bank. No ordering is provided across banks.
//!
//! ## Usage
//!
//! ```
//! use rust_modbus_bridge::address_space::{AddressSpace, BankKind, CellValue};
//!
//! let space = AddressSpace::new(1000);
//! space.set(BankKind::Coil, 104, CellValue::Bit(true)).unwrap();
//! let values = space.get(BankKind::Coil, 100, 10).unwrap();
//! assert_eq!(values[4], CellValue::Bit(true));
//! ```

mod bank;

pub use bank::{BankKind, CellValue};

use bank::Cells;
use log::debug;
use parking_lot::RwLock;
use thiserror::Error;

/// Errors raised by address space accesses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressSpaceError {
    /// The requested address range does not fit in the bank
    #[error("range {start}..{end} is outside the {bank} bank (length {len})")]
    Range {
        bank: BankKind,
        start: usize,
        end: usize,
        len: usize,
    },

    /// The value does not belong to the bank's value domain
    #[error("{bank} hold {expected} values, got a {found} value")]
    Type {
        bank: BankKind,
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, AddressSpaceError>;

/// Fixed-size Modbus address space shared by the slave bridge and the
/// persistence synchronizer.
#[derive(Debug)]
pub struct AddressSpace {
    bank_size: usize,
    discrete_inputs: RwLock<Cells>,
    input_registers: RwLock<Cells>,
    coils: RwLock<Cells>,
    holding_registers: RwLock<Cells>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BANK_SIZE)
    }
}

impl AddressSpace {
    /// Number of cells per bank in the reference deployment
    pub const DEFAULT_BANK_SIZE: usize = 1000;

    /// Create an address space where every bank holds `bank_size` cells
    /// initialised to `false` / `0`.
    pub fn new(bank_size: usize) -> Self {
        Self {
            bank_size,
            discrete_inputs: RwLock::new(Cells::new(BankKind::DiscreteInput, bank_size)),
            input_registers: RwLock::new(Cells::new(BankKind::InputRegister, bank_size)),
            coils: RwLock::new(Cells::new(BankKind::Coil, bank_size)),
            holding_registers: RwLock::new(Cells::new(BankKind::HoldingRegister, bank_size)),
        }
    }

    /// Number of cells in every bank
    pub fn bank_size(&self) -> usize {
        self.bank_size
    }

    fn bank(&self, kind: BankKind) -> &RwLock<Cells> {
        match kind.storage() {
            BankKind::DiscreteInput => &self.discrete_inputs,
            BankKind::InputRegister => &self.input_registers,
            BankKind::HoldingRegister => &self.holding_registers,
            // Indicator resolves to the coil bank through storage()
            BankKind::Coil | BankKind::Indicator => &self.coils,
        }
    }

    fn check_range(&self, kind: BankKind, start: usize, count: usize) -> Result<usize> {
        let end = start + count;
        if end > self.bank_size {
            return Err(AddressSpaceError::Range {
                bank: kind,
                start,
                end,
                len: self.bank_size,
            });
        }
        Ok(end)
    }

    /// Read `count` cells starting at `start`, in address order.
    pub fn get(&self, kind: BankKind, start: u16, count: u16) -> Result<Vec<CellValue>> {
        let start = usize::from(start);
        let end = self.check_range(kind, start, usize::from(count))?;
        Ok(self.bank(kind).read().slice(start, end))
    }

    /// Write one cell and return its previous value.
    pub fn set(&self, kind: BankKind, address: u16, value: CellValue) -> Result<CellValue> {
        let address = usize::from(address);
        self.check_range(kind, address, 1)?;

        let mut cells = self.bank(kind).write();
        let previous = match (&mut *cells, value) {
            (Cells::Bits(bits), CellValue::Bit(b)) => {
                CellValue::Bit(std::mem::replace(&mut bits[address], b))
            }
            (Cells::Words(words), CellValue::Word(w)) => {
                CellValue::Word(std::mem::replace(&mut words[address], w))
            }
            _ => {
                return Err(AddressSpaceError::Type {
                    bank: kind,
                    expected: kind.default_value().domain(),
                    found: value.domain(),
                })
            }
        };
        debug!("{} {}: {} -> {}", kind, address, previous, value);
        Ok(previous)
    }

    /// Read a range of a boolean bank.
    pub fn read_bits(&self, kind: BankKind, start: u16, count: u16) -> Result<Vec<bool>> {
        let start = usize::from(start);
        let end = self.check_range(kind, start, usize::from(count))?;
        match &*self.bank(kind).read() {
            Cells::Bits(bits) => Ok(bits[start..end].to_vec()),
            Cells::Words(_) => Err(AddressSpaceError::Type {
                bank: kind,
                expected: "16-bit integer",
                found: "boolean",
            }),
        }
    }

    /// Read a range of a register bank.
    pub fn read_words(&self, kind: BankKind, start: u16, count: u16) -> Result<Vec<u16>> {
        let start = usize::from(start);
        let end = self.check_range(kind, start, usize::from(count))?;
        match &*self.bank(kind).read() {
            Cells::Words(words) => Ok(words[start..end].to_vec()),
            Cells::Bits(_) => Err(AddressSpaceError::Type {
                bank: kind,
                expected: "boolean",
                found: "16-bit integer",
            }),
        }
    }

    /// Write one boolean cell and return the previous value.
    pub fn write_bit(&self, kind: BankKind, address: u16, value: bool) -> Result<bool> {
        self.set(kind, address, CellValue::Bit(value))
            .map(|previous| previous.as_bit().unwrap_or_default())
    }

    /// Write one register cell and return the previous value.
    pub fn write_word(&self, kind: BankKind, address: u16, value: u16) -> Result<u16> {
        self.set(kind, address, CellValue::Word(value))
            .map(|previous| previous.as_word().unwrap_or_default())
    }

    /// Consistent copy of a whole bank, taken under a single read lock.
    pub fn snapshot(&self, kind: BankKind) -> Vec<CellValue> {
        self.bank(kind).read().slice(0, self.bank_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn write_then_read_every_coil() {
        let space = AddressSpace::new(64);
        for address in 0..64u16 {
            let value = address % 3 == 0;
            space.write_bit(BankKind::Coil, address, value).unwrap();
            assert_eq!(
                space.read_bits(BankKind::Coil, address, 1).unwrap(),
                vec![value]
            );
        }
    }

    #[test]
    fn set_returns_previous_value() {
        let space = AddressSpace::default();
        assert_eq!(
            space.set(BankKind::HoldingRegister, 3, CellValue::Word(7)),
            Ok(CellValue::Word(0))
        );
        assert_eq!(
            space.set(BankKind::HoldingRegister, 3, CellValue::Word(9)),
            Ok(CellValue::Word(7))
        );
    }

    #[test]
    fn ranges_past_the_end_are_rejected() {
        let space = AddressSpace::new(1000);
        assert_eq!(space.get(BankKind::Coil, 990, 10).unwrap().len(), 10);
        assert_eq!(space.get(BankKind::Coil, 1000, 0).unwrap().len(), 0);
        assert!(matches!(
            space.get(BankKind::Coil, 991, 10),
            Err(AddressSpaceError::Range { end: 1001, .. })
        ));
        assert!(matches!(
            space.set(BankKind::HoldingRegister, 1000, CellValue::Word(1)),
            Err(AddressSpaceError::Range { .. })
        ));
        assert!(space.read_words(BankKind::InputRegister, u16::MAX, 2).is_err());
    }

    #[test]
    fn value_domain_mismatch_is_a_type_error() {
        let space = AddressSpace::default();
        assert!(matches!(
            space.set(BankKind::Coil, 0, CellValue::Word(1)),
            Err(AddressSpaceError::Type { .. })
        ));
        assert!(matches!(
            space.set(BankKind::HoldingRegister, 0, CellValue::Bit(true)),
            Err(AddressSpaceError::Type { .. })
        ));
        assert!(space.read_words(BankKind::Coil, 0, 1).is_err());
        assert!(space.read_bits(BankKind::HoldingRegister, 0, 1).is_err());
    }

    #[test]
    fn indicators_alias_the_coil_bank() {
        let space = AddressSpace::default();
        space.write_bit(BankKind::Coil, 42, true).unwrap();
        assert_eq!(
            space.read_bits(BankKind::Indicator, 42, 1).unwrap(),
            vec![true]
        );
        assert_eq!(space.read_bits(BankKind::DiscreteInput, 42, 1).unwrap(), vec![false]);

        assert_eq!(
            space.set(BankKind::Indicator, 43, CellValue::Bit(true)),
            Ok(CellValue::Bit(false))
        );
        assert_eq!(space.read_bits(BankKind::Coil, 43, 1).unwrap(), vec![true]);
    }

    #[test]
    fn snapshots_are_never_torn() {
        let space = Arc::new(AddressSpace::new(1000));
        let writer = {
            let space = Arc::clone(&space);
            std::thread::spawn(move || {
                for round in 1..=200u16 {
                    for address in 0..1000u16 {
                        space.write_word(BankKind::HoldingRegister, address, round).unwrap();
                    }
                }
            })
        };

        for _ in 0..200 {
            let snapshot = space.snapshot(BankKind::HoldingRegister);
            assert_eq!(snapshot.len(), 1000);
            // Writes go in ascending address order, so values never increase
            // along the bank.
            let words: Vec<u16> = snapshot.iter().filter_map(|v| v.as_word()).collect();
            assert!(words.windows(2).all(|w| w[0] >= w[1]));
        }
        writer.join().unwrap();
    }
}
