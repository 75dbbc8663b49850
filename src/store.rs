// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Register and coil storage consulted by the responder.

use std::{fmt, ops::Range};

use crate::frame::{Address, Coil, ExceptionCode, Quantity, Word};

/// The four Modbus data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Coils,
    DiscreteInputs,
    HoldingRegisters,
    InputRegisters,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Coils => "coils",
            Self::DiscreteInputs => "discrete inputs",
            Self::HoldingRegisters => "holding registers",
            Self::InputRegisters => "input registers",
        })
    }
}

/// Bounded access to the device's data tables.
///
/// Every accessor rejects ranges outside the table with
/// [`ExceptionCode::IllegalDataAddress`].
pub trait DataStore {
    /// Number of items held in `table`.
    fn capacity(&self, table: Table) -> usize;

    fn read_coils(&self, address: Address, quantity: Quantity) -> Result<Vec<Coil>, ExceptionCode>;

    fn read_discrete_inputs(
        &self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Coil>, ExceptionCode>;

    fn read_holding_registers(
        &self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>, ExceptionCode>;

    fn read_input_registers(
        &self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>, ExceptionCode>;

    fn write_coil(&mut self, address: Address, state: Coil) -> Result<(), ExceptionCode>;
}

/// A physical output wired to a coil.
pub trait OutputDriver {
    /// Called after `coil` has been written with `state`.
    fn drive(&mut self, coil: Address, state: Coil);
}

/// Drives nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOutputs;

impl OutputDriver for NoOutputs {
    fn drive(&mut self, _coil: Address, _state: Coil) {}
}

impl<F> OutputDriver for F
where
    F: FnMut(Address, Coil),
{
    fn drive(&mut self, coil: Address, state: Coil) {
        self(coil, state);
    }
}

pub const DEFAULT_COIL_COUNT: usize = 23;
pub const DEFAULT_DISCRETE_INPUT_COUNT: usize = 128;
pub const DEFAULT_HOLDING_REGISTER_COUNT: usize = 9;
pub const DEFAULT_INPUT_REGISTER_COUNT: usize = 9;

/// Coils wired to physical outputs on the reference device.
pub const DEFAULT_OUTPUT_COILS: [Address; 2] = [0, 3];

/// Fixed-size in-memory tables, zero-initialised.
///
/// Lives as long as the process; nothing is persisted.
#[derive(Debug, Clone)]
pub struct MemoryStore<D = NoOutputs> {
    coils: Vec<Coil>,
    discrete_inputs: Vec<Coil>,
    holding_registers: Vec<Word>,
    input_registers: Vec<Word>,
    output_coils: Vec<Address>,
    driver: D,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(
            DEFAULT_COIL_COUNT,
            DEFAULT_DISCRETE_INPUT_COUNT,
            DEFAULT_HOLDING_REGISTER_COUNT,
            DEFAULT_INPUT_REGISTER_COUNT,
        )
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new(
        coils: usize,
        discrete_inputs: usize,
        holding_registers: usize,
        input_registers: usize,
    ) -> Self {
        Self {
            coils: vec![false; coils],
            discrete_inputs: vec![false; discrete_inputs],
            holding_registers: vec![0; holding_registers],
            input_registers: vec![0; input_registers],
            output_coils: DEFAULT_OUTPUT_COILS.to_vec(),
            driver: NoOutputs,
        }
    }
}

fn range(len: usize, address: Address, quantity: Quantity) -> Result<Range<usize>, ExceptionCode> {
    let start = usize::from(address);
    let end = start + usize::from(quantity);
    if end > len {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    Ok(start..end)
}

fn set<T>(table: &mut [T], address: Address, value: T) -> Result<(), ExceptionCode> {
    let item = table
        .get_mut(usize::from(address))
        .ok_or(ExceptionCode::IllegalDataAddress)?;
    *item = value;
    Ok(())
}

impl<D> MemoryStore<D> {
    /// Replaces the output driver.
    #[must_use]
    pub fn with_driver<E>(self, driver: E) -> MemoryStore<E> {
        let Self {
            coils,
            discrete_inputs,
            holding_registers,
            input_registers,
            output_coils,
            driver: _,
        } = self;
        MemoryStore {
            coils,
            discrete_inputs,
            holding_registers,
            input_registers,
            output_coils,
            driver,
        }
    }

    /// Selects the coils whose writes are forwarded to the driver.
    #[must_use]
    pub fn with_output_coils(mut self, coils: impl IntoIterator<Item = Address>) -> Self {
        self.output_coils = coils.into_iter().collect();
        self
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    #[must_use]
    pub fn coil(&self, address: Address) -> Option<Coil> {
        self.coils.get(usize::from(address)).copied()
    }

    #[must_use]
    pub fn discrete_input(&self, address: Address) -> Option<Coil> {
        self.discrete_inputs.get(usize::from(address)).copied()
    }

    #[must_use]
    pub fn holding_register(&self, address: Address) -> Option<Word> {
        self.holding_registers.get(usize::from(address)).copied()
    }

    #[must_use]
    pub fn input_register(&self, address: Address) -> Option<Word> {
        self.input_registers.get(usize::from(address)).copied()
    }

    /// Sets a coil from the device side without driving the output.
    pub fn set_coil(&mut self, address: Address, state: Coil) -> Result<(), ExceptionCode> {
        set(&mut self.coils, address, state)
    }

    pub fn set_discrete_input(
        &mut self,
        address: Address,
        state: Coil,
    ) -> Result<(), ExceptionCode> {
        set(&mut self.discrete_inputs, address, state)
    }

    pub fn set_holding_register(
        &mut self,
        address: Address,
        value: Word,
    ) -> Result<(), ExceptionCode> {
        set(&mut self.holding_registers, address, value)
    }

    pub fn set_input_register(
        &mut self,
        address: Address,
        value: Word,
    ) -> Result<(), ExceptionCode> {
        set(&mut self.input_registers, address, value)
    }
}

impl<D: OutputDriver> DataStore for MemoryStore<D> {
    fn capacity(&self, table: Table) -> usize {
        match table {
            Table::Coils => self.coils.len(),
            Table::DiscreteInputs => self.discrete_inputs.len(),
            Table::HoldingRegisters => self.holding_registers.len(),
            Table::InputRegisters => self.input_registers.len(),
        }
    }

    fn read_coils(&self, address: Address, quantity: Quantity) -> Result<Vec<Coil>, ExceptionCode> {
        let range = range(self.coils.len(), address, quantity)?;
        Ok(self.coils[range].to_vec())
    }

    fn read_discrete_inputs(
        &self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Coil>, ExceptionCode> {
        let range = range(self.discrete_inputs.len(), address, quantity)?;
        Ok(self.discrete_inputs[range].to_vec())
    }

    fn read_holding_registers(
        &self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>, ExceptionCode> {
        let range = range(self.holding_registers.len(), address, quantity)?;
        Ok(self.holding_registers[range].to_vec())
    }

    fn read_input_registers(
        &self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>, ExceptionCode> {
        let range = range(self.input_registers.len(), address, quantity)?;
        Ok(self.input_registers[range].to_vec())
    }

    fn write_coil(&mut self, address: Address, state: Coil) -> Result<(), ExceptionCode> {
        set(&mut self.coils, address, state)?;
        if self.output_coils.contains(&address) {
            log::debug!("Driving output for coil {address}: {state}");
            self.driver.drive(address, state);
        }
        Ok(())
    }
}
