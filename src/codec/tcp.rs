// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::{self, Cursor, Error, ErrorKind};

use byteorder::{BigEndian, ReadBytesExt as _};

use super::{encode_response_result_pdu, response_result_pdu_size, u16_len, REQUEST_PDU_SIZE};
use crate::{
    bytes::{BufMut as _, Bytes, BytesMut},
    error::FormatError,
    frame::{tcp::*, *},
};

const HEADER_LEN: usize = 7;

/// Bytes preceding the MBAP length field's payload: transaction id,
/// protocol id and the length field itself.
const LENGTH_FIELD_END: usize = 6;

const PROTOCOL_ID: u16 = 0x0000; // TCP

/// The largest request accepted, sized for a fixed-length request PDU.
pub const MAX_REQUEST_SIZE: usize = HEADER_LEN + REQUEST_PDU_SIZE;

/// The smallest frame that still carries a function code.
const MIN_REQUEST_SIZE: usize = HEADER_LEN + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mbap {
    hdr: Header,
    protocol_id: u16,
    length: u16,
}

fn read_mbap(buf: &[u8]) -> io::Result<Mbap> {
    let rdr = &mut Cursor::new(buf);
    let transaction_id = rdr.read_u16::<BigEndian>()?;
    let protocol_id = rdr.read_u16::<BigEndian>()?;
    let length = rdr.read_u16::<BigEndian>()?;
    let unit_id = rdr.read_u8()?;
    Ok(Mbap {
        hdr: Header {
            transaction_id,
            unit_id,
        },
        protocol_id,
        length,
    })
}

/// Decodes one delivered buffer into a request.
///
/// Only framing is checked here. Quantities, addresses and coil values
/// are left for validation.
///
/// # Errors
///
/// Returns a [`FormatError`] for buffers that must be dropped without a
/// reply.
pub fn decode_request(buf: &[u8]) -> Result<RequestAdu, FormatError> {
    let len = buf.len();
    if len > MAX_REQUEST_SIZE {
        return Err(FormatError::Oversized {
            len,
            max: MAX_REQUEST_SIZE,
        });
    }
    let truncated = |expected| FormatError::Truncated { len, expected };
    if len < MIN_REQUEST_SIZE {
        return Err(truncated(MIN_REQUEST_SIZE));
    }
    let Mbap {
        hdr,
        protocol_id,
        length,
    } = read_mbap(buf).map_err(|_| truncated(HEADER_LEN))?;
    if protocol_id != PROTOCOL_ID {
        return Err(FormatError::InvalidProtocolId(protocol_id));
    }
    if usize::from(length) != len - LENGTH_FIELD_END {
        return Err(FormatError::LengthMismatch {
            declared: length,
            actual: len - LENGTH_FIELD_END,
        });
    }
    let pdu_data = &buf[HEADER_LEN..];
    if FunctionCode::new(pdu_data[0]).is_supported() && pdu_data.len() < REQUEST_PDU_SIZE {
        return Err(truncated(MAX_REQUEST_SIZE));
    }
    let pdu = RequestPdu::try_from(pdu_data).map_err(|_| truncated(MAX_REQUEST_SIZE))?;
    Ok(RequestAdu { hdr, pdu })
}

fn encode_header(buf: &mut BytesMut, hdr: Header, pdu_len: usize) {
    buf.put_u16(hdr.transaction_id);
    buf.put_u16(PROTOCOL_ID);
    buf.put_u16(u16_len(pdu_len + 1));
    buf.put_u8(hdr.unit_id);
}

/// Appends the encoded reply to `buf`.
pub fn encode_response(adu: &ResponseAdu, buf: &mut BytesMut) {
    let ResponseAdu { hdr, pdu } = adu;
    let pdu_len = response_result_pdu_size(&pdu.0);
    buf.reserve(HEADER_LEN + pdu_len);
    encode_header(buf, *hdr, pdu_len);
    encode_response_result_pdu(buf, &pdu.0);
}

#[must_use]
pub fn encode_response_to_bytes(adu: &ResponseAdu) -> Bytes {
    let mut buf = BytesMut::new();
    encode_response(adu, &mut buf);
    buf.freeze()
}

/// Decodes a complete reply frame as a client would receive it.
///
/// # Errors
///
/// Fails with [`ErrorKind::InvalidData`] if the frame is malformed.
pub fn decode_response(buf: &[u8]) -> io::Result<ResponseAdu> {
    let Mbap {
        hdr,
        protocol_id,
        length,
    } = read_mbap(buf)?;
    if protocol_id != PROTOCOL_ID {
        return Err(Error::new(ErrorKind::InvalidData, "Invalid protocol ID"));
    }
    if buf.len() != LENGTH_FIELD_END + usize::from(length) {
        return Err(Error::new(ErrorKind::InvalidData, "Invalid length field"));
    }
    let pdu = ResponsePdu::try_from(&buf[HEADER_LEN..])?;
    Ok(ResponseAdu { hdr, pdu })
}

/// Frames a TCP connection for the responder.
///
/// Each chunk handed over by the socket is taken as one complete request;
/// requests are neither reassembled nor split.
#[cfg(feature = "tcp-server")]
#[derive(Debug, Default)]
pub(crate) struct ServerCodec;

#[cfg(feature = "tcp-server")]
impl tokio_util::codec::Decoder for ServerCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<Bytes>> {
        if buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(buf.split().freeze()))
    }
}

#[cfg(feature = "tcp-server")]
impl tokio_util::codec::Encoder<Bytes> for ServerCodec {
    type Error = Error;

    fn encode(&mut self, reply: Bytes, buf: &mut BytesMut) -> io::Result<()> {
        buf.extend_from_slice(&reply);
        Ok(())
    }
}
