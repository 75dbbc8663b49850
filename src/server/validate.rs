// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Range checks for decoded requests.

use crate::{
    codec::packed_bits_size,
    frame::{Address, ExceptionCode, Quantity, Request, Word, COIL_OFF, COIL_ON},
    map::RegisterMap,
    store::{DataStore, Table},
};

/// Protocol maximum for a single bit read, 250 bytes of payload.
const MAX_READ_BITS: Quantity = 2000;

/// Protocol maximum for a single register read, 250 bytes of payload.
const MAX_READ_REGISTERS: Quantity = 125;

/// A request that passed validation, with its derived sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read Coils or Read Discrete Inputs.
    ReadBits {
        table: Table,
        address: Address,
        quantity: Quantity,
        byte_count: u8,
        /// Number of used bits in the last byte, `0` if it is full.
        remainder: u8,
    },

    /// Read Holding Registers or Read Input Registers.
    ReadWords {
        table: Table,
        address: Address,
        quantity: Quantity,
        byte_count: u8,
    },

    WriteCoil {
        address: Address,
        value: Word,
    },
}

/// Checks `req` against the register map and the store's capacity.
///
/// Quantity and value are checked before the address, so a request
/// violating both is answered with [`ExceptionCode::IllegalDataValue`].
///
/// # Errors
///
/// Returns the exception code to answer with.
pub fn validate<S>(
    req: &Request,
    map: &RegisterMap,
    store: &S,
) -> Result<Operation, ExceptionCode>
where
    S: DataStore + ?Sized,
{
    use Request::*;

    match *req {
        ReadCoils(address, quantity) => read_bits(Table::Coils, address, quantity, map, store),
        ReadDiscreteInputs(address, quantity) => {
            read_bits(Table::DiscreteInputs, address, quantity, map, store)
        }
        ReadHoldingRegisters(address, quantity) => {
            read_words(Table::HoldingRegisters, address, quantity, map, store)
        }
        ReadInputRegisters(address, quantity) => {
            read_words(Table::InputRegisters, address, quantity, map, store)
        }
        WriteSingleCoil(address, value) => write_coil(address, value, map, store),
        Unsupported(_) => Err(ExceptionCode::IllegalFunction),
    }
}

fn check_quantity(quantity: Quantity, max: Quantity) -> Result<(), ExceptionCode> {
    if quantity == 0 || quantity > max {
        return Err(ExceptionCode::IllegalDataValue);
    }
    Ok(())
}

fn check_span(address: Address, span: usize, bound: usize) -> Result<(), ExceptionCode> {
    if usize::from(address) + span > bound {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn read_bits<S>(
    table: Table,
    address: Address,
    quantity: Quantity,
    map: &RegisterMap,
    store: &S,
) -> Result<Operation, ExceptionCode>
where
    S: DataStore + ?Sized,
{
    let limits = map.limits(table);
    check_quantity(quantity, limits.max_quantity.min(MAX_READ_BITS))?;
    // Bounded by MAX_READ_BITS, so both fit into a byte.
    let byte_count = packed_bits_size(quantity.into()) as u8;
    let remainder = (quantity % 8) as u8;
    check_span(address, byte_count.into(), limits.address_bound.into())?;
    check_span(address, quantity.into(), store.capacity(table))?;
    Ok(Operation::ReadBits {
        table,
        address,
        quantity,
        byte_count,
        remainder,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn read_words<S>(
    table: Table,
    address: Address,
    quantity: Quantity,
    map: &RegisterMap,
    store: &S,
) -> Result<Operation, ExceptionCode>
where
    S: DataStore + ?Sized,
{
    let limits = map.limits(table);
    check_quantity(quantity, limits.max_quantity.min(MAX_READ_REGISTERS))?;
    check_span(address, quantity.into(), limits.address_bound.into())?;
    check_span(address, quantity.into(), store.capacity(table))?;
    Ok(Operation::ReadWords {
        table,
        address,
        quantity,
        // Bounded by MAX_READ_REGISTERS.
        byte_count: (quantity * 2) as u8,
    })
}

fn write_coil<S>(
    address: Address,
    value: Word,
    map: &RegisterMap,
    store: &S,
) -> Result<Operation, ExceptionCode>
where
    S: DataStore + ?Sized,
{
    if value != COIL_ON && value != COIL_OFF {
        return Err(ExceptionCode::IllegalDataValue);
    }
    if !map.is_writable_coil(address) {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    check_span(address, 1, store.capacity(Table::Coils))?;
    Ok(Operation::WriteCoil { address, value })
}
