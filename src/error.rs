// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.

use thiserror::Error;

/// A received buffer that cannot be answered at all.
///
/// Frames failing with a [`FormatError`] are dropped without a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The buffer is larger than any request this responder accepts.
    #[error("request of {len} bytes exceeds the maximum of {max} bytes")]
    Oversized { len: usize, max: usize },

    /// The buffer ends before all fields of the request.
    #[error("request of {len} bytes is truncated, expected {expected} bytes")]
    Truncated { len: usize, expected: usize },

    /// The MBAP protocol identifier is not `0` (Modbus).
    #[error("invalid protocol id: 0x{0:04X}")]
    InvalidProtocolId(u16),

    /// The MBAP length field disagrees with the number of bytes received.
    #[error("length field {declared} does not match {actual} received bytes")]
    LengthMismatch { declared: u16, actual: usize },
}
