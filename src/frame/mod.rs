// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

pub(crate) mod tcp;

use std::{
    error,
    fmt::{self, Display},
};

/// A Modbus function code.
///
/// Only the function codes answered by this responder have named variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    /// 01 (0x01) Read Coils.
    ReadCoils,

    /// 02 (0x02) Read Discrete Inputs
    ReadDiscreteInputs,

    /// 03 (0x03) Read Holding Registers
    ReadHoldingRegisters,

    /// 04 (0x04) Read Input Registers
    ReadInputRegisters,

    /// 05 (0x05) Write Single Coil
    WriteSingleCoil,

    /// Any other function code. Always answered with
    /// [`ExceptionCode::IllegalFunction`].
    Unsupported(u8),
}

impl FunctionCode {
    /// Create a new [`FunctionCode`] with `value`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        match value {
            0x01 => Self::ReadCoils,
            0x02 => Self::ReadDiscreteInputs,
            0x03 => Self::ReadHoldingRegisters,
            0x04 => Self::ReadInputRegisters,
            0x05 => Self::WriteSingleCoil,
            code => Self::Unsupported(code),
        }
    }

    /// Gets the [`u8`] value of the current [`FunctionCode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::ReadCoils => 0x01,
            Self::ReadDiscreteInputs => 0x02,
            Self::ReadHoldingRegisters => 0x03,
            Self::ReadInputRegisters => 0x04,
            Self::WriteSingleCoil => 0x05,
            Self::Unsupported(code) => code,
        }
    }

    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value().fmt(f)
    }
}

/// A Modbus protocol address is represented by 16 bit from `0` to `65535`.
///
/// Protocol addresses are 0-based.
pub type Address = u16;

/// A Coil represents a single bit.
///
/// - `true` is equivalent to `ON`, `1` and `0xFF00`.
/// - `false` is equivalent to `OFF`, `0` and `0x0000`.
pub type Coil = bool;

/// Modbus uses 16 bit for its data items.
///
/// Transmitted using a big-endian representation.
pub type Word = u16;

/// Number of items to process.
pub type Quantity = u16;

/// Wire value of a coil switched on.
pub const COIL_ON: Word = 0xFF00;

/// Wire value of a coil switched off.
pub const COIL_OFF: Word = 0x0000;

/// A request as decoded from the wire, before validation.
///
/// Quantities and coil values are kept exactly as received so that range
/// checks can answer with the matching exception code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// The first parameter is the address of the first coil to read.
    /// The second parameter is the number of coils to read.
    ReadCoils(Address, Quantity),

    /// The first parameter is the address of the first discrete input to read.
    /// The second parameter is the number of discrete inputs to read.
    ReadDiscreteInputs(Address, Quantity),

    /// The first parameter is the address of the first holding register to read.
    /// The second parameter is the number of holding registers to read.
    ReadHoldingRegisters(Address, Quantity),

    /// The first parameter is the address of the first input register to read.
    /// The second parameter is the number of input registers to read.
    ReadInputRegisters(Address, Quantity),

    /// The first parameter is the address of the coil.
    /// The second parameter is the raw output value, `0xFF00` or `0x0000`
    /// when well-formed.
    WriteSingleCoil(Address, Word),

    /// A function code this responder does not implement.
    Unsupported(u8),
}

impl Request {
    /// Get the [`FunctionCode`] of the [`Request`].
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        use Request::*;

        match self {
            ReadCoils(_, _) => FunctionCode::ReadCoils,
            ReadDiscreteInputs(_, _) => FunctionCode::ReadDiscreteInputs,
            ReadHoldingRegisters(_, _) => FunctionCode::ReadHoldingRegisters,
            ReadInputRegisters(_, _) => FunctionCode::ReadInputRegisters,
            WriteSingleCoil(_, _) => FunctionCode::WriteSingleCoil,
            Unsupported(code) => FunctionCode::Unsupported(*code),
        }
    }
}

/// The data of a successful request.
///
/// ReadCoils/ReadDiscreteInputs: the vector holds exactly the requested
/// number of bits. Packing pads the last byte with zero bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The parameter contains the coil values that have been read.
    ReadCoils(Vec<Coil>),

    /// The parameter contains the discrete input values that have been read.
    ReadDiscreteInputs(Vec<Coil>),

    /// The parameter contains the register values that have been read.
    ReadHoldingRegisters(Vec<Word>),

    /// The parameter contains the register values that have been read.
    ReadInputRegisters(Vec<Word>),

    /// Echo of a `WriteSingleCoil` request.
    /// The first parameter contains the address of the coil that has been written to.
    /// The second parameter contains the raw value as received.
    WriteSingleCoil(Address, Word),
}

impl Response {
    /// Get the [`FunctionCode`] of the [`Response`].
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        use Response::*;

        match self {
            ReadCoils(_) => FunctionCode::ReadCoils,
            ReadDiscreteInputs(_) => FunctionCode::ReadDiscreteInputs,
            ReadHoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            ReadInputRegisters(_) => FunctionCode::ReadInputRegisters,
            WriteSingleCoil(_, _) => FunctionCode::WriteSingleCoil,
        }
    }
}

/// A server (slave) exception.
///
/// The responder never answers with any other exception code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    /// 0x01
    IllegalFunction,
    /// 0x02
    IllegalDataAddress,
    /// 0x03
    IllegalDataValue,
}

impl From<ExceptionCode> for u8 {
    fn from(from: ExceptionCode) -> Self {
        use crate::frame::ExceptionCode::*;
        match from {
            IllegalFunction => 0x01,
            IllegalDataAddress => 0x02,
            IllegalDataValue => 0x03,
        }
    }
}

impl ExceptionCode {
    /// Create an [`ExceptionCode`] from its wire value, if it is one of
    /// the codes this responder produces.
    #[must_use]
    pub const fn try_from_value(value: u8) -> Option<Self> {
        use crate::frame::ExceptionCode::*;

        Some(match value {
            0x01 => IllegalFunction,
            0x02 => IllegalDataAddress,
            0x03 => IllegalDataValue,
            _ => return None,
        })
    }

    pub(crate) fn description(&self) -> &str {
        use crate::frame::ExceptionCode::*;

        match *self {
            IllegalFunction => "Illegal function",
            IllegalDataAddress => "Illegal data address",
            IllegalDataValue => "Illegal data value",
        }
    }
}

/// A server (slave) exception response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionResponse {
    pub function: FunctionCode,
    pub exception: ExceptionCode,
}

/// The PDU of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestPdu(pub(crate) Request);

impl From<Request> for RequestPdu {
    fn from(from: Request) -> Self {
        RequestPdu(from)
    }
}

impl From<RequestPdu> for Request {
    fn from(from: RequestPdu) -> Self {
        from.0
    }
}

/// The PDU of a reply: either data or an exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponsePdu(pub(crate) Result<Response, ExceptionResponse>);

impl From<Response> for ResponsePdu {
    fn from(from: Response) -> Self {
        ResponsePdu(Ok(from))
    }
}

impl From<ExceptionResponse> for ResponsePdu {
    fn from(from: ExceptionResponse) -> Self {
        ResponsePdu(Err(from))
    }
}

impl From<Result<Response, ExceptionResponse>> for ResponsePdu {
    fn from(from: Result<Response, ExceptionResponse>) -> Self {
        ResponsePdu(from)
    }
}

impl From<ResponsePdu> for Result<Response, ExceptionResponse> {
    fn from(from: ResponsePdu) -> Self {
        from.0
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl error::Error for ExceptionCode {}

impl fmt::Display for ExceptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modbus function {}: {}", self.function, self.exception)
    }
}

impl error::Error for ExceptionResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_function_code() {
        assert_eq!(FunctionCode::ReadCoils, FunctionCode::new(0x01));
        assert_eq!(FunctionCode::ReadDiscreteInputs, FunctionCode::new(0x02));
        assert_eq!(FunctionCode::ReadHoldingRegisters, FunctionCode::new(0x03));
        assert_eq!(FunctionCode::ReadInputRegisters, FunctionCode::new(0x04));
        assert_eq!(FunctionCode::WriteSingleCoil, FunctionCode::new(0x05));

        assert_eq!(FunctionCode::Unsupported(0x06), FunctionCode::new(0x06));
        assert_eq!(FunctionCode::Unsupported(0x10), FunctionCode::new(0x10));
        assert_eq!(FunctionCode::Unsupported(0x00), FunctionCode::new(0x00));
    }

    #[test]
    fn function_code_values() {
        assert_eq!(FunctionCode::ReadCoils.value(), 0x01);
        assert_eq!(FunctionCode::ReadDiscreteInputs.value(), 0x02);
        assert_eq!(FunctionCode::ReadHoldingRegisters.value(), 0x03);
        assert_eq!(FunctionCode::ReadInputRegisters.value(), 0x04);
        assert_eq!(FunctionCode::WriteSingleCoil.value(), 0x05);
        assert_eq!(FunctionCode::Unsupported(70).value(), 70);
    }

    #[test]
    fn supported_function_codes() {
        assert!((1..=5).all(|code| FunctionCode::new(code).is_supported()));
        assert!(!FunctionCode::new(6).is_supported());
        assert!(!FunctionCode::new(0x0F).is_supported());
    }

    #[test]
    fn function_code_from_request() {
        use Request::*;

        assert_eq!(ReadCoils(0, 0).function_code(), FunctionCode::ReadCoils);
        assert_eq!(
            ReadDiscreteInputs(0, 0).function_code(),
            FunctionCode::ReadDiscreteInputs
        );
        assert_eq!(
            ReadHoldingRegisters(0, 0).function_code(),
            FunctionCode::ReadHoldingRegisters
        );
        assert_eq!(
            ReadInputRegisters(0, 0).function_code(),
            FunctionCode::ReadInputRegisters
        );
        assert_eq!(
            WriteSingleCoil(0, COIL_ON).function_code(),
            FunctionCode::WriteSingleCoil
        );
        assert_eq!(Unsupported(88).function_code().value(), 88);
    }

    #[test]
    fn function_code_from_response() {
        use Response::*;

        assert_eq!(ReadCoils(vec![]).function_code(), FunctionCode::ReadCoils);
        assert_eq!(
            ReadDiscreteInputs(vec![]).function_code(),
            FunctionCode::ReadDiscreteInputs
        );
        assert_eq!(
            ReadHoldingRegisters(vec![]).function_code(),
            FunctionCode::ReadHoldingRegisters
        );
        assert_eq!(
            ReadInputRegisters(vec![]).function_code(),
            FunctionCode::ReadInputRegisters
        );
        assert_eq!(
            WriteSingleCoil(0x0, COIL_OFF).function_code(),
            FunctionCode::WriteSingleCoil
        );
    }

    #[test]
    fn exception_code_values() {
        assert_eq!(u8::from(ExceptionCode::IllegalFunction), 1);
        assert_eq!(u8::from(ExceptionCode::IllegalDataAddress), 2);
        assert_eq!(u8::from(ExceptionCode::IllegalDataValue), 3);
        assert_eq!(
            ExceptionCode::try_from_value(2),
            Some(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(ExceptionCode::try_from_value(4), None);
    }

    #[test]
    fn response_pdu_from_result() {
        let pdu: ResponsePdu = Ok(Response::ReadInputRegisters(vec![7])).into();
        assert_eq!(pdu.0, Ok(Response::ReadInputRegisters(vec![7])));

        let exception = ExceptionResponse {
            function: FunctionCode::Unsupported(0x06),
            exception: ExceptionCode::IllegalFunction,
        };
        let pdu: ResponsePdu = Err(exception).into();
        let res: Result<Response, ExceptionResponse> = pdu.into();
        assert_eq!(res, Err(exception));
    }

    #[test]
    fn exception_response_display() {
        let rsp = ExceptionResponse {
            function: FunctionCode::ReadHoldingRegisters,
            exception: ExceptionCode::IllegalDataAddress,
        };
        assert_eq!(rsp.to_string(), "Modbus function 3: Illegal data address");
    }
}
