// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Bank kinds and cell values
//!
//! A bank is a fixed-length array of cells of a single kind. Coils and
//! discrete inputs hold booleans, holding and input registers hold 16-bit
//! unsigned integers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical bank of the address space.
///
/// `Indicator` is not a separate storage area: it aliases the coil bank for
/// both reads and writes, kept distinct so that callers can label the values
/// they access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankKind {
    /// Read-only booleans, written only by the field side
    DiscreteInput,
    /// Read-only 16-bit registers, written only by the field side
    InputRegister,
    /// Read/write booleans
    Coil,
    /// Read/write 16-bit registers
    HoldingRegister,
    /// Alias over the coil bank. Writes through it land in the coils.
    Indicator,
}

impl BankKind {
    /// All five logical banks, in the order used by aggregate reads.
    pub const ALL: [BankKind; 5] = [
        BankKind::DiscreteInput,
        BankKind::InputRegister,
        BankKind::Coil,
        BankKind::HoldingRegister,
        BankKind::Indicator,
    ];

    /// The bank that actually owns the cells for this logical bank.
    pub fn storage(self) -> BankKind {
        match self {
            BankKind::Indicator => BankKind::Coil,
            other => other,
        }
    }

    /// Whether cells of this bank hold booleans (as opposed to registers).
    pub fn is_bit(self) -> bool {
        matches!(
            self.storage(),
            BankKind::DiscreteInput | BankKind::Coil
        )
    }

    /// Default value of a freshly initialised cell.
    pub fn default_value(self) -> CellValue {
        if self.is_bit() {
            CellValue::Bit(false)
        } else {
            CellValue::Word(0)
        }
    }
}

impl fmt::Display for BankKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BankKind::DiscreteInput => "discrete inputs",
            BankKind::InputRegister => "input registers",
            BankKind::Coil => "coils",
            BankKind::HoldingRegister => "holding registers",
            BankKind::Indicator => "indicators",
        };
        f.write_str(name)
    }
}

/// Value of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bit(bool),
    Word(u16),
}

impl CellValue {
    pub fn as_bit(self) -> Option<bool> {
        match self {
            CellValue::Bit(b) => Some(b),
            CellValue::Word(_) => None,
        }
    }

    pub fn as_word(self) -> Option<u16> {
        match self {
            CellValue::Word(w) => Some(w),
            CellValue::Bit(_) => None,
        }
    }

    /// Name of the value domain, used in error messages.
    pub fn domain(self) -> &'static str {
        match self {
            CellValue::Bit(_) => "boolean",
            CellValue::Word(_) => "16-bit integer",
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bit(value)
    }
}

impl From<u16> for CellValue {
    fn from(value: u16) -> Self {
        CellValue::Word(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bit(b) => write!(f, "{b}"),
            CellValue::Word(w) => write!(f, "{w}"),
        }
    }
}

/// Backing storage of one bank.
#[derive(Debug, Clone)]
pub(crate) enum Cells {
    Bits(Vec<bool>),
    Words(Vec<u16>),
}

impl Cells {
    pub(crate) fn new(kind: BankKind, len: usize) -> Self {
        if kind.is_bit() {
            Cells::Bits(vec![false; len])
        } else {
            Cells::Words(vec![0; len])
        }
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> Vec<CellValue> {
        match self {
            Cells::Bits(v) => v[start..end].iter().copied().map(CellValue::Bit).collect(),
            Cells::Words(v) => v[start..end].iter().copied().map(CellValue::Word).collect(),
        }
    }
}
