//! WebSocket push server.
//!
//! Viewers connect here to watch the board. The channel is receive-only after
//! connect: the first frame is always a full snapshot, followed by every
//! subsequent board-mutation broadcast. Inbound text frames are ignored;
//! pings are answered. A peer close, protocol error, or failed send ends the
//! loop and deregisters the channel.

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::AppContext;

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let addr = format!("{}:{}", ctx.config.bind_address, ctx.config.ws_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "realtime server listening (WebSocket)");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(c) => c,
            Err(e) => {
                error!(err = %e, "accept error");
                continue;
            }
        };
        debug!(peer = %peer, "new viewer connection");
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, ctx).await {
                warn!(peer = %peer, err = %e, "connection error");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, ctx: Arc<AppContext>) -> Result<()> {
    let ws = accept_async(stream).await?;
    let (mut sink, mut stream) = ws.split();

    // Registration queues the snapshot ahead of any concurrent broadcast.
    let (channel_id, mut outbound) = ctx.board.connect_viewer().await?;

    loop {
        tokio::select! {
            // Inbound frame from the viewer
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(err = %e, "ws error");
                        break;
                    }
                    // Receive-only channel — other inbound frames are ignored.
                    Some(Ok(_)) => {}
                }
            }
            // Queued broadcast (or the initial snapshot)
            queued = outbound.recv() => {
                match queued {
                    Some(json) => {
                        if let Err(e) = sink.send(Message::Text(json)).await {
                            warn!(err = %e, "send error");
                            break;
                        }
                    }
                    // Sender side gone — registry dropped this channel.
                    None => break,
                }
            }
        }
    }

    ctx.board.disconnect_viewer(channel_id).await;
    Ok(())
}
