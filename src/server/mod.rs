// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP responder.
//!
//! [`handle`] turns one received buffer into at most one reply. It keeps no
//! state between calls; everything that outlives a request lives in the
//! [`DataStore`].

mod validate;

#[cfg(feature = "tcp-server")]
pub mod tcp;

use log::{debug, trace, warn};

pub use self::validate::{validate, Operation};

use crate::{
    bytes::Bytes,
    codec::tcp::{decode_request, encode_response_to_bytes},
    frame::{
        tcp::{RequestAdu, ResponseAdu},
        ExceptionCode, ExceptionResponse, Request, Response, COIL_ON,
    },
    map::RegisterMap,
    store::{DataStore, Table},
};

/// Reads or writes the store for a validated operation.
///
/// # Errors
///
/// A store refusing the range yields [`ExceptionCode::IllegalDataAddress`].
pub fn execute<S>(op: Operation, store: &mut S) -> Result<Response, ExceptionCode>
where
    S: DataStore + ?Sized,
{
    let rsp = match op {
        Operation::ReadBits {
            table,
            address,
            quantity,
            ..
        } => match table {
            Table::DiscreteInputs => {
                Response::ReadDiscreteInputs(store.read_discrete_inputs(address, quantity)?)
            }
            _ => Response::ReadCoils(store.read_coils(address, quantity)?),
        },
        Operation::ReadWords {
            table,
            address,
            quantity,
            ..
        } => match table {
            Table::InputRegisters => {
                Response::ReadInputRegisters(store.read_input_registers(address, quantity)?)
            }
            _ => Response::ReadHoldingRegisters(store.read_holding_registers(address, quantity)?),
        },
        Operation::WriteCoil { address, value } => {
            store.write_coil(address, value == COIL_ON)?;
            Response::WriteSingleCoil(address, value)
        }
    };
    Ok(rsp)
}

/// Answers a decoded request, with data or with an exception.
pub fn process<S>(store: &mut S, map: &RegisterMap, adu: RequestAdu) -> ResponseAdu
where
    S: DataStore + ?Sized,
{
    let RequestAdu { hdr, pdu } = adu;
    let req: Request = pdu.into();
    let res = validate(&req, map, store)
        .and_then(|op| execute(op, store))
        .map_err(|exception| {
            debug!("Answering {req:?} with exception: {exception}");
            ExceptionResponse {
                function: req.function_code(),
                exception,
            }
        });
    ResponseAdu {
        hdr,
        pdu: res.into(),
    }
}

/// Handles one received buffer.
///
/// Returns the encoded reply, or `None` if the buffer is dropped without
/// a reply.
pub fn handle<S>(store: &mut S, map: &RegisterMap, frame: &[u8]) -> Option<Bytes>
where
    S: DataStore + ?Sized,
{
    trace!("Received {frame:02X?}");
    let adu = match decode_request(frame) {
        Ok(adu) => adu,
        Err(err) => {
            warn!("Dropping request without reply: {err}");
            return None;
        }
    };
    let reply = encode_response_to_bytes(&process(store, map, adu));
    trace!("Replying {:02X?}", &reply[..]);
    Some(reply)
}

/// A store and its register map, ready to answer requests.
#[derive(Debug, Clone, Default)]
pub struct Responder<S> {
    store: S,
    map: RegisterMap,
}

impl<S> Responder<S>
where
    S: DataStore,
{
    /// Serves `store` with the device's default register map.
    pub fn new(store: S) -> Self {
        Self {
            store,
            map: RegisterMap::default(),
        }
    }

    #[must_use]
    pub fn with_map(mut self, map: RegisterMap) -> Self {
        self.map = map;
        self
    }

    /// See [`handle`].
    pub fn handle(&mut self, frame: &[u8]) -> Option<Bytes> {
        let Self { store, map } = self;
        handle(store, map, frame)
    }

    pub fn map(&self) -> &RegisterMap {
        &self.map
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
