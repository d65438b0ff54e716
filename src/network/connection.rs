//! Connection - serves one verified peer.
//!
//! ```text
//! Phase 1: Preamble    `PEER <identity>` within the preamble timeout
//!    ↓
//! Phase 2: Gate        make_handler() picks master/public or rejects
//!    ↓
//! Phase 3: Serve       one request per line, one JSON reply per request,
//!                      until `quit`, EOF, or room shutdown
//! ```

use super::preamble::parse_preamble;
use crate::error::{HandlerError, ok_reply};
use crate::handlers::{Context, SessionHandler};
use crate::identity::Identity;
use crate::state::Room;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Longest accepted request line, in bytes.
const MAX_LINE_LEN: usize = 4096;

type Transport = Framed<TcpStream, LinesCodec>;

fn error_reply(code: &str, error: impl std::fmt::Display) -> Value {
    json!({ "ok": false, "error": error.to_string(), "code": code })
}

/// A peer connection handler.
pub struct Connection {
    id: Uuid,
    addr: SocketAddr,
    room: Arc<Room>,
    stream: TcpStream,
}

impl Connection {
    pub fn new(id: Uuid, stream: TcpStream, addr: SocketAddr, room: Arc<Room>) -> Self {
        Self {
            id,
            addr,
            room,
            stream,
        }
    }

    /// Run the connection to completion.
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            id,
            addr,
            room,
            stream,
        } = self;
        let mut transport = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN));

        // Subscribe before the gate so a shutdown after admission is never missed.
        let mut shutdown = room.subscribe_shutdown();

        let line = match tokio::time::timeout(room.preamble_timeout, transport.next()).await {
            Err(_) => {
                warn!("Preamble timed out");
                send(&mut transport, error_reply("timeout", "preamble timed out")).await?;
                return Ok(());
            }
            Ok(None) => {
                debug!("Closed before preamble");
                return Ok(());
            }
            Ok(Some(Err(e))) => {
                send(&mut transport, error_reply("bad_preamble", &e)).await?;
                return Err(e.into());
            }
            Ok(Some(Ok(line))) => line,
        };

        let peer = match parse_preamble(&line) {
            Ok(peer) => peer,
            Err(e) => {
                warn!(error = %e, "Rejected preamble");
                send(&mut transport, error_reply("bad_preamble", &e)).await?;
                return Ok(());
            }
        };

        let handler = match room.gate.make_handler(&peer).await {
            Ok(handler) => handler,
            Err(e) => {
                send(&mut transport, error_reply(e.error_code(), &e)).await?;
                return Ok(());
            }
        };

        let kind = handler.kind();
        send(&mut transport, ok_reply(json!({ "handler": kind.as_str() }))).await?;

        room.sessions.open(id, peer.clone(), kind, addr);
        info!(%peer, handler = kind.as_str(), "Session opened");

        let result = serve(&room, &peer, &handler, &mut transport, &mut shutdown).await;

        room.sessions.close(&id);
        info!(%peer, "Session closed");
        result
    }
}

/// Request loop for an admitted session.
async fn serve(
    room: &Room,
    peer: &Identity,
    handler: &SessionHandler,
    transport: &mut Transport,
    shutdown: &mut broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                send(transport, error_reply("shutdown", "room is shutting down")).await?;
                return Ok(());
            }
            next = transport.next() => {
                let line = match next {
                    None => return Ok(()),
                    Some(Ok(line)) => line,
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        let reply = error_reply("line_too_long", "request line too long");
                        send(transport, reply).await?;
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(e.into()),
                };

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "quit" {
                    send(transport, ok_reply(json!("bye"))).await?;
                    return Ok(());
                }

                let reply = match room.principal(handler.kind(), peer).await {
                    Ok(principal) => {
                        let ctx = Context {
                            room,
                            peer,
                            kind: handler.kind(),
                            principal,
                            manifest: handler.manifest(),
                        };
                        match handler.dispatch(&ctx, line).await {
                            Ok(result) => ok_reply(result),
                            Err(e) => e.to_reply(),
                        }
                    }
                    Err(e) => HandlerError::Database(e).to_reply(),
                };

                send(transport, reply).await?;
            }
        }
    }
}

async fn send(transport: &mut Transport, reply: Value) -> Result<(), LinesCodecError> {
    transport.send(reply.to_string()).await
}
