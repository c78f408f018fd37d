//! Control-surface host connection.
//!
//! ```text
//!   connect()
//!      │  sends registration {event, uuid}
//!      ├── writer task  ← HostMessage via mpsc, serialised → socket
//!      └── reader task  ← JSON frames → EngineEvent::Host
//! ```
//!
//! The host owns the plugin's lifetime; when its socket closes the reader
//! posts `EngineEvent::Shutdown`.
use deck_proto::platform;
use deck_proto::protocol::{HostEvent, HostMessage, Registration};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::engine::EngineEvent;
use crate::error::Result;

pub struct HostHandles {
    pub writer: tokio::task::JoinHandle<()>,
    pub reader: tokio::task::JoinHandle<()>,
}

/// Open the host socket, register, and start the IO tasks.
pub async fn connect(
    port: u16,
    registration: Registration,
    host_rx: mpsc::Receiver<HostMessage>,
    event_tx: mpsc::Sender<EngineEvent>,
) -> Result<HostHandles> {
    let url = platform::host_socket_url(port);
    let (socket, _) = connect_async(url.as_str()).await?;
    info!("host: connected to {}", url);

    let (mut sink, stream) = socket.split();
    sink.send(Message::text(registration.encode()?)).await?;
    info!("host: registered as {}", registration.uuid);

    Ok(HostHandles {
        writer: tokio::spawn(writer_task(sink, host_rx)),
        reader: tokio::spawn(reader_task(stream, event_tx)),
    })
}

// ── writer task ───────────────────────────────────────────────────────────────

async fn writer_task<S>(mut sink: S, mut rx: mpsc::Receiver<HostMessage>)
where
    S: futures_util::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(msg) = rx.recv().await {
        let text = match msg.encode() {
            Ok(t) => t,
            Err(e) => {
                warn!("host writer: encode failed: {}", e);
                continue;
            }
        };
        if let Err(e) = sink.send(Message::text(text)).await {
            warn!("host writer: write error: {}", e);
            break;
        }
    }
    debug!("host writer: task exiting");
}

// ── reader task ───────────────────────────────────────────────────────────────

async fn reader_task<S, E>(mut stream: S, event_tx: mpsc::Sender<EngineEvent>)
where
    S: futures_util::Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!("host reader: read error: {}", e);
                break;
            }
        };

        match HostEvent::decode(text.as_str()) {
            Ok(HostEvent::Other) => {}
            Ok(evt) => {
                if event_tx.send(EngineEvent::Host(evt)).await.is_err() {
                    return;
                }
            }
            Err(e) => debug!("host reader: undecodable event: {}", e),
        }
    }

    info!("host: socket closed");
    let _ = event_tx.send(EngineEvent::Shutdown).await;
}
