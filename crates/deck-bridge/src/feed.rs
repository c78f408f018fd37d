//! Upstream feed connection.
//!
//! Keeps one WebSocket open to the player companion.  Every (re)connect sends
//! the same subscription request; every text frame that parses as JSON is
//! forwarded to the engine.  When the socket closes or cannot be opened the
//! manager sleeps for a fixed delay and tries again, forever.
use std::time::Duration;

use deck_proto::protocol::SubscribeRequest;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::engine::EngineEvent;
use crate::error::{BridgeError, Result};

pub struct FeedManager {
    url: String,
    reconnect_delay: Duration,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl FeedManager {
    pub fn new(url: &str, reconnect_delay: Duration, event_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            url: url.to_string(),
            reconnect_delay,
            event_tx,
        }
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Connect/reconnect loop.  Returns only once the engine is gone.
    pub async fn run(self) {
        loop {
            match self.session().await {
                Ok(()) => info!("feed: connection to {} closed", self.url),
                Err(BridgeError::ChannelClosed) => break,
                Err(e) => warn!("feed: {}: {}", self.url, e),
            }

            if self.event_tx.is_closed() {
                break;
            }
            debug!("feed: reconnecting in {:?}", self.reconnect_delay);
            tokio::time::sleep(self.reconnect_delay).await;
        }
        debug!("feed: engine gone, stopping");
    }

    /// One connection lifetime: subscribe, then forward messages until the
    /// socket closes.
    async fn session(&self) -> Result<()> {
        let (socket, _) = connect_async(self.url.as_str()).await?;
        info!("feed: connected to {}", self.url);
        let (mut sink, mut stream) = socket.split();

        let subscribe = SubscribeRequest::all_fields().encode()?;
        sink.send(Message::text(subscribe)).await?;

        while let Some(frame) = stream.next().await {
            match frame? {
                Message::Text(text) => match serde_json::from_str::<Value>(text.as_str()) {
                    Ok(value) => {
                        self.event_tx
                            .send(EngineEvent::Feed(value))
                            .await
                            .map_err(|_| BridgeError::ChannelClosed)?;
                    }
                    Err(e) => debug!("feed: dropping unparsable message: {}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
        Ok(())
    }
}
