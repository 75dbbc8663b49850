// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP transport for a [`Responder`].

use std::{
    future::Future,
    io,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use futures_util::{SinkExt as _, StreamExt as _};
use log::{debug, info, trace};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinSet,
};
use tokio_util::codec::Framed;

use super::Responder;
use crate::{bytes::Bytes, codec::tcp::ServerCodec, store::DataStore};

const LISTEN_BACKLOG: i32 = 1024;

/// A responder shared by all connections of a server.
pub type SharedResponder<S> = Arc<Mutex<Responder<S>>>;

/// Accepts connections and answers requests on each of them.
///
/// Requests of concurrent connections are answered one at a time.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Attach the Modbus server to a TCP socket server.
    #[must_use]
    pub fn new(listener: TcpListener) -> Self {
        Self { listener }
    }

    /// Opens a listening socket with `SO_REUSEADDR` set.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        listener(addr).map(Self::new)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves connections until accepting fails.
    ///
    /// Errors of a single connection end only that connection and are
    /// passed to `on_process_error`. All open connections are closed when
    /// the returned future is dropped.
    pub async fn serve<S, OnProcessError>(
        &self,
        responder: SharedResponder<S>,
        on_process_error: OnProcessError,
    ) -> io::Result<()>
    where
        S: DataStore + Send + 'static,
        OnProcessError: FnOnce(io::Error) + Clone + Send + 'static,
    {
        info!("Listening on {}", self.listener.local_addr()?);
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, socket_addr) = accepted?;
                    info!("Connected: {socket_addr}");
                    let responder = Arc::clone(&responder);
                    let on_process_error = on_process_error.clone();
                    connections.spawn(async move {
                        let framed = Framed::new(stream, ServerCodec);
                        if let Err(err) = process(framed, &responder).await {
                            on_process_error(err);
                        }
                        info!("Closed: {socket_addr}");
                    });
                }
                Some(_) = connections.join_next() => {}
            }
        }
    }

    /// Like [`Self::serve`], but stops once `shutdown_signal` resolves.
    ///
    /// Connected clients are disconnected on shutdown.
    pub async fn serve_until<S, OnProcessError, Sd>(
        &self,
        responder: SharedResponder<S>,
        on_process_error: OnProcessError,
        shutdown_signal: Sd,
    ) -> io::Result<()>
    where
        S: DataStore + Send + 'static,
        OnProcessError: FnOnce(io::Error) + Clone + Send + 'static,
        Sd: Future<Output = ()>,
    {
        tokio::select! {
            res = self.serve(responder, on_process_error) => res,
            () = shutdown_signal => {
                trace!("Shutdown signal received");
                Ok(())
            }
        }
    }
}

/// The request-response loop of a single connection.
async fn process<S>(
    mut framed: Framed<TcpStream, ServerCodec>,
    responder: &Mutex<Responder<S>>,
) -> io::Result<()>
where
    S: DataStore,
{
    while let Some(frame) = framed.next().await {
        let frame = frame?;
        let Some(reply) = respond(responder, &frame)? else {
            debug!("No reply for {} received bytes", frame.len());
            continue;
        };
        framed.send(reply).await?;
    }
    // tcp socket closed
    Ok(())
}

fn respond<S>(responder: &Mutex<Responder<S>>, frame: &[u8]) -> io::Result<Option<Bytes>>
where
    S: DataStore,
{
    let mut responder = responder
        .lock()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "responder lock poisoned"))?;
    Ok(responder.handle(frame))
}

/// Start TCP listener - configure and open TCP socket
fn listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    TcpListener::from_std(socket.into())
}
