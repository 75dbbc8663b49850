// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types and traits

///////////////////////////////////////////////////////////////////
/// Modules
///////////////////////////////////////////////////////////////////
pub use crate::server;

#[allow(missing_docs)]
#[cfg(feature = "tcp-server")]
pub mod tcp {
    pub use crate::server::tcp::*;
}

///////////////////////////////////////////////////////////////////
/// Types
///////////////////////////////////////////////////////////////////
pub use crate::{ExceptionCode, Request, Response};
pub use crate::{Header, Limits, MemoryStore, RegisterMap, Responder, Table};

///////////////////////////////////////////////////////////////////
/// Traits
///////////////////////////////////////////////////////////////////
pub use crate::{DataStore, OutputDriver};
