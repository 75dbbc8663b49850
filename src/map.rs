// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Register map limits of the device.

use crate::{
    frame::{Address, Quantity},
    store::{Table, DEFAULT_OUTPUT_COILS},
};

/// Per-table limits applied before any data is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest quantity a single read may request. The smallest is always 1.
    pub max_quantity: Quantity,

    /// Upper bound for the address span of a read.
    ///
    /// For coils and discrete inputs the span is the start address plus the
    /// response byte count, for registers it is the start address plus the
    /// quantity.
    pub address_bound: u16,
}

impl Limits {
    #[must_use]
    pub const fn new(max_quantity: Quantity, address_bound: u16) -> Self {
        Self {
            max_quantity,
            address_bound,
        }
    }
}

/// The register map served by the responder.
///
/// ```
/// use modbus_responder::{Limits, RegisterMap, Table};
///
/// let map = RegisterMap::default()
///     .with_limits(Table::HoldingRegisters, Limits::new(4, 4))
///     .with_writable_coils([0, 1, 2, 3]);
/// assert_eq!(map.limits(Table::HoldingRegisters).max_quantity, 4);
/// assert!(map.is_writable_coil(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMap {
    coils: Limits,
    discrete_inputs: Limits,
    holding_registers: Limits,
    input_registers: Limits,
    writable_coils: Vec<Address>,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            coils: Limits::new(23, 23),
            discrete_inputs: Limits::new(4, 128),
            holding_registers: Limits::new(9, 9),
            input_registers: Limits::new(9, 9),
            writable_coils: DEFAULT_OUTPUT_COILS.to_vec(),
        }
    }
}

impl RegisterMap {
    #[must_use]
    pub const fn limits(&self, table: Table) -> Limits {
        match table {
            Table::Coils => self.coils,
            Table::DiscreteInputs => self.discrete_inputs,
            Table::HoldingRegisters => self.holding_registers,
            Table::InputRegisters => self.input_registers,
        }
    }

    #[must_use]
    pub fn with_limits(mut self, table: Table, limits: Limits) -> Self {
        match table {
            Table::Coils => self.coils = limits,
            Table::DiscreteInputs => self.discrete_inputs = limits,
            Table::HoldingRegisters => self.holding_registers = limits,
            Table::InputRegisters => self.input_registers = limits,
        }
        self
    }

    /// Coils that may be written with Write Single Coil.
    #[must_use]
    pub fn with_writable_coils(mut self, coils: impl IntoIterator<Item = Address>) -> Self {
        self.writable_coils = coils.into_iter().collect();
        self
    }

    #[must_use]
    pub fn writable_coils(&self) -> &[Address] {
        &self.writable_coils
    }

    #[must_use]
    pub fn is_writable_coil(&self, address: Address) -> bool {
        self.writable_coils.contains(&address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_defaults() {
        let map = RegisterMap::default();
        assert_eq!(map.limits(Table::Coils), Limits::new(23, 23));
        assert_eq!(map.limits(Table::DiscreteInputs), Limits::new(4, 128));
        assert_eq!(map.limits(Table::HoldingRegisters), Limits::new(9, 9));
        assert_eq!(map.limits(Table::InputRegisters), Limits::new(9, 9));
        assert_eq!(map.writable_coils(), &[0, 3]);
    }

    #[test]
    fn override_single_table() {
        let map = RegisterMap::default().with_limits(Table::InputRegisters, Limits::new(2, 16));
        assert_eq!(map.limits(Table::InputRegisters), Limits::new(2, 16));
        assert_eq!(map.limits(Table::HoldingRegisters), Limits::new(9, 9));
    }

    #[test]
    fn writable_coils() {
        let map = RegisterMap::default();
        assert!(map.is_writable_coil(0));
        assert!(!map.is_writable_coil(1));
        assert!(map.is_writable_coil(3));
        assert!(!map.is_writable_coil(0x0100));

        let map = map.with_writable_coils([5]);
        assert!(!map.is_writable_coil(0));
        assert!(map.is_writable_coil(5));
    }
}
