// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{
    convert::TryFrom,
    io::{self, BufRead as _, Cursor, Error, ErrorKind},
};

use byteorder::{BigEndian, ReadBytesExt as _};

use crate::{
    bytes::{Buf as _, BufMut as _, BytesMut},
    frame::{Coil, RequestPdu, ResponsePdu},
    ExceptionCode, ExceptionResponse, FunctionCode, Request, Response,
};

pub(crate) mod tcp;

/// Size of every request PDU this responder answers with data:
/// function code, address and quantity/value.
pub(crate) const REQUEST_PDU_SIZE: usize = 5;

/// Size of an exception PDU: function code and exception code.
pub(crate) const EXCEPTION_PDU_SIZE: usize = 2;

#[allow(clippy::cast_possible_truncation)]
fn u16_len(len: usize) -> u16 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u16::MAX.into());
    len as u16
}

#[allow(clippy::cast_possible_truncation)]
fn u8_len(len: usize) -> u8 {
    // This type conversion should always be safe, because either
    // the caller is responsible to pass a valid usize or the
    // possible values are limited by the protocol.
    debug_assert!(len <= u8::MAX.into());
    len as u8
}

fn encode_response_pdu(buf: &mut BytesMut, rsp: &Response) {
    use crate::frame::Response::*;
    buf.put_u8(rsp.function_code().value());
    match rsp {
        ReadCoils(coils) | ReadDiscreteInputs(coils) => {
            buf.put_u8(u8_len(packed_coils_size(coils)));
            encode_packed_coils(buf, coils);
        }
        ReadHoldingRegisters(registers) | ReadInputRegisters(registers) => {
            buf.put_u8(u8_len(registers.len() * 2));
            for r in registers {
                buf.put_u16(*r);
            }
        }
        WriteSingleCoil(address, value) => {
            buf.put_u16(*address);
            buf.put_u16(*value);
        }
    }
}

fn encode_exception_response_pdu(buf: &mut BytesMut, rsp: ExceptionResponse) {
    buf.put_u8(rsp.function.value() | 0x80);
    buf.put_u8(rsp.exception.into());
}

fn encode_response_result_pdu(buf: &mut BytesMut, res: &Result<Response, ExceptionResponse>) {
    match res {
        Ok(rsp) => encode_response_pdu(buf, rsp),
        Err(rsp) => encode_exception_response_pdu(buf, *rsp),
    }
}

fn read_u16_be(reader: &mut impl io::Read) -> io::Result<u16> {
    reader.read_u16::<BigEndian>()
}

impl TryFrom<&[u8]> for Request {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        use crate::frame::Request::*;
        let rdr = &mut Cursor::new(bytes);
        let fn_code = rdr.read_u8()?;
        let req = match FunctionCode::new(fn_code) {
            FunctionCode::ReadCoils => ReadCoils(read_u16_be(rdr)?, read_u16_be(rdr)?),
            FunctionCode::ReadDiscreteInputs => {
                ReadDiscreteInputs(read_u16_be(rdr)?, read_u16_be(rdr)?)
            }
            FunctionCode::ReadHoldingRegisters => {
                ReadHoldingRegisters(read_u16_be(rdr)?, read_u16_be(rdr)?)
            }
            FunctionCode::ReadInputRegisters => {
                ReadInputRegisters(read_u16_be(rdr)?, read_u16_be(rdr)?)
            }
            // The value is checked by the validator, not here.
            FunctionCode::WriteSingleCoil => WriteSingleCoil(read_u16_be(rdr)?, read_u16_be(rdr)?),
            FunctionCode::Unsupported(code) => {
                // Whatever follows is never interpreted.
                return Ok(Unsupported(code));
            }
        };
        // Verify that all data has been consumed and decoded.
        if rdr.has_remaining() {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                "undecoded request data",
            ));
        }
        Ok(req)
    }
}

impl TryFrom<&[u8]> for RequestPdu {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let pdu = Request::try_from(bytes)?.into();
        Ok(pdu)
    }
}

/// Decodes a reply PDU as a client would see it.
///
/// The exact quantity of a bit read is not part of the reply, so whole
/// bytes are unpacked.
impl TryFrom<&[u8]> for Response {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        use crate::frame::Response::*;
        let rdr = &mut Cursor::new(bytes);
        let fn_code = rdr.read_u8()?;
        let rsp = match FunctionCode::new(fn_code) {
            FunctionCode::ReadCoils | FunctionCode::ReadDiscreteInputs => {
                let byte_count = usize::from(rdr.read_u8()?);
                if bytes.len() < 2 + byte_count {
                    return Err(io::Error::new(ErrorKind::InvalidData, "too short"));
                }
                let packed_coils = &bytes[2..2 + byte_count];
                rdr.consume(byte_count);
                let coils = decode_packed_coils(packed_coils, u16_len(byte_count * 8));
                if fn_code == 0x01 {
                    ReadCoils(coils)
                } else {
                    ReadDiscreteInputs(coils)
                }
            }
            FunctionCode::ReadHoldingRegisters | FunctionCode::ReadInputRegisters => {
                let byte_count = rdr.read_u8()?;
                if byte_count % 2 != 0 {
                    return Err(io::Error::new(ErrorKind::InvalidData, "invalid quantity"));
                }
                let quantity = byte_count / 2;
                let mut data = Vec::with_capacity(quantity.into());
                for _ in 0..quantity {
                    data.push(read_u16_be(rdr)?);
                }
                if fn_code == 0x03 {
                    ReadHoldingRegisters(data)
                } else {
                    ReadInputRegisters(data)
                }
            }
            FunctionCode::WriteSingleCoil => WriteSingleCoil(read_u16_be(rdr)?, read_u16_be(rdr)?),
            FunctionCode::Unsupported(code) => {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("invalid function code: 0x{code:02X}"),
                ));
            }
        };
        // Verify that all data has been consumed and decoded.
        if rdr.has_remaining() {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                "undecoded response data",
            ));
        }
        Ok(rsp)
    }
}

impl TryFrom<&[u8]> for ExceptionResponse {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let mut rdr = Cursor::new(bytes);
        let fn_err_code = rdr.read_u8()?;
        if fn_err_code < 0x80 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "Invalid exception function code",
            ));
        }
        let function = fn_err_code - 0x80;
        let code = rdr.read_u8()?;
        let exception = ExceptionCode::try_from_value(code).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidData,
                format!("invalid exception code: 0x{code:02X}"),
            )
        })?;
        Ok(ExceptionResponse {
            function: FunctionCode::new(function),
            exception,
        })
    }
}

impl TryFrom<&[u8]> for ResponsePdu {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let fn_code = Cursor::new(bytes).read_u8()?;
        let pdu = if fn_code < 0x80 {
            Response::try_from(bytes)?.into()
        } else {
            ExceptionResponse::try_from(bytes)?.into()
        };
        Ok(pdu)
    }
}

/// Number of bytes needed to carry `quantity` packed bits.
pub(crate) const fn packed_bits_size(quantity: usize) -> usize {
    (quantity + 7) / 8
}

fn packed_coils_size(coils: &[Coil]) -> usize {
    packed_bits_size(coils.len())
}

/// Packs the bits LSB first. Bits past the last coil stay zero.
fn encode_packed_coils(buf: &mut BytesMut, coils: &[Coil]) -> usize {
    let packed_coils_size = packed_coils_size(coils);
    let offset = buf.len();
    buf.resize(offset + packed_coils_size, 0);
    let buf = &mut buf[offset..];
    for (i, b) in coils.iter().enumerate() {
        let v = u8::from(*b); // 0 or 1
        buf[i / 8] |= v << (i % 8);
    }
    packed_coils_size
}

fn decode_packed_coils(bytes: &[u8], count: u16) -> Vec<Coil> {
    let mut res = Vec::with_capacity(count.into());
    for i in 0usize..count.into() {
        res.push((bytes[i / 8] >> (i % 8)) & 0b1 > 0);
    }
    res
}

fn response_pdu_size(rsp: &Response) -> usize {
    use crate::frame::Response::*;
    match rsp {
        ReadCoils(coils) | ReadDiscreteInputs(coils) => 2 + packed_coils_size(coils),
        ReadHoldingRegisters(data) | ReadInputRegisters(data) => 2 + data.len() * 2,
        WriteSingleCoil(_, _) => 5,
    }
}

fn response_result_pdu_size(res: &Result<Response, ExceptionResponse>) -> usize {
    match res {
        Ok(rsp) => response_pdu_size(rsp),
        Err(_) => EXCEPTION_PDU_SIZE,
    }
}
