// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [Modbus TCP](https://en.wikipedia.org/wiki/Modbus) slave responder.
//!
//! Every received buffer passes through the same pipeline: the MBAP header
//! and request PDU are decoded, the request is validated against a
//! [`RegisterMap`] and a [`DataStore`], and the reply is encoded with the
//! request's transaction and unit identifiers echoed back.
//!
//! Invalid requests are answered with a Modbus exception. Malformed frames
//! are dropped without a reply.
//!
//! The engine in [`server`] is synchronous and does not touch any socket.
//! With the `tcp-server` feature (enabled by default) `server::tcp::Server`
//! serves it on a Tokio `TcpListener`.
//!
//! ```
//! use modbus_responder::{MemoryStore, Responder};
//!
//! let mut responder = Responder::new(MemoryStore::default());
//! responder.store_mut().set_holding_register(0, 0x1234).unwrap();
//!
//! // Read Holding Registers, address 0, quantity 1
//! let reply = responder
//!     .handle(&[0x00, 0x2A, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x01])
//!     .unwrap();
//! assert_eq!(
//!     &reply[..],
//!     &[0x00, 0x2A, 0x00, 0x00, 0x00, 0x05, 0x01, 0x03, 0x02, 0x12, 0x34]
//! );
//! ```

#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(unreachable_pub)]
#![warn(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Re-export `bytes` crate
pub use bytes;

pub mod prelude;

pub mod map;
pub mod server;
pub mod store;

mod codec;
mod error;
mod frame;

pub use self::{
    codec::tcp::{
        decode_request, decode_response, encode_response, encode_response_to_bytes,
        MAX_REQUEST_SIZE,
    },
    error::FormatError,
    frame::{
        tcp::{Header, RequestAdu, ResponseAdu, TransactionId, UnitId},
        Address, Coil, ExceptionCode, ExceptionResponse, FunctionCode, Quantity, Request, Response,
        Word, COIL_OFF, COIL_ON,
    },
    map::{Limits, RegisterMap},
    server::{handle, process, Responder},
    store::{DataStore, MemoryStore, NoOutputs, OutputDriver, Table},
};
