// SPDX-FileCopyrightText: Copyright (c) 2017-2023 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

pub type TransactionId = u16;
pub type UnitId = u8;

/// The MBAP fields that are echoed from a request into its reply.
///
/// The protocol identifier is always `0` for accepted requests and the
/// length field is derived from the PDU, so neither is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub transaction_id: TransactionId,
    pub unit_id: UnitId,
}

/// A decoded request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAdu {
    pub(crate) hdr: Header,
    pub(crate) pdu: RequestPdu,
}

impl RequestAdu {
    #[must_use]
    pub const fn header(&self) -> Header {
        self.hdr
    }

    #[must_use]
    pub const fn request(&self) -> Request {
        self.pdu.0
    }
}

/// A reply frame, either data or an exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseAdu {
    pub(crate) hdr: Header,
    pub(crate) pdu: ResponsePdu,
}

impl ResponseAdu {
    #[must_use]
    pub const fn header(&self) -> Header {
        self.hdr
    }

    #[must_use]
    pub fn result(&self) -> Result<&Response, &ExceptionResponse> {
        self.pdu.0.as_ref()
    }
}

impl From<RequestAdu> for Request {
    fn from(from: RequestAdu) -> Self {
        from.pdu.into()
    }
}
