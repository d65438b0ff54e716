//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the room's listen address and spawns a Connection task
//! for each peer until the room shuts down.

use crate::network::Connection;
use crate::state::Room;
use crate::telemetry::spans;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{Instrument, error, info, instrument};
use uuid::Uuid;

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    room: Arc<Room>,
    shutdown: broadcast::Receiver<()>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, room: Arc<Room>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let shutdown = room.subscribe_shutdown();
        info!(addr = %listener.local_addr()?, "Listener bound");

        Ok(Self {
            listener,
            room,
            shutdown,
        })
    }

    /// Accept connections until the room shuts down.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!("Gateway stopped accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let id = Uuid::new_v4();
                        let room = Arc::clone(&self.room);
                        let span = spans::connection(&id.to_string(), &addr);

                        tokio::spawn(
                            async move {
                                info!("Connection accepted");
                                let connection = Connection::new(id, stream, addr, room);
                                if let Err(e) = connection.run().await {
                                    error!(error = %e, "Connection error");
                                }
                            }
                            .instrument(span),
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                    }
                }
            }
        }
    }
}
