// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # TCP responder example
//!
//! Serves a seeded in-memory device on `127.0.0.1:5502` until Ctrl-C is
//! pressed. Writes to the output coils are logged.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example tcp-responder
//! ```

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use modbus_responder::{prelude::*, server::tcp::Server, Address, Coil};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let socket_addr: SocketAddr = "127.0.0.1:5502".parse()?;

    let mut store = MemoryStore::default().with_driver(|coil: Address, state: Coil| {
        let state = if state { "on" } else { "off" };
        log::info!("Output {coil} switched {state}");
    });
    // Insert some test data as register values.
    for (address, value) in [(0, 1234), (1, 5678)] {
        store.set_input_register(address, value)?;
    }
    for (address, value) in [(0, 10), (1, 20), (2, 30), (3, 40)] {
        store.set_holding_register(address, value)?;
    }
    store.set_discrete_input(1, true)?;
    store.set_discrete_input(2, true)?;

    let responder = Arc::new(Mutex::new(Responder::new(store)));
    let server = Server::bind(socket_addr)?;
    let on_process_error = |err| {
        log::error!("{err}");
    };
    let shutdown_signal = async {
        tokio::signal::ctrl_c().await.ok();
    };
    server
        .serve_until(responder, on_process_error, shutdown_signal)
        .await?;

    log::info!("Stopped");
    Ok(())
}
