//! Client for the player companion's HTTP control API.
//!
//! Commands are fire-and-forget: the outcome is reported only to the button
//! that was pressed (`showOk` on 200, `showAlert` when the request fails).
use deck_proto::protocol::{DeckAction, HostMessage};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::EngineEvent;
use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Toggle,
    Next,
    Previous,
    Shuffle,
    Repeat,
    VolumeUp,
    VolumeDown,
}

impl TransportCommand {
    pub fn from_action(action: DeckAction) -> Option<Self> {
        let cmd = match action {
            DeckAction::PlayPause => TransportCommand::Toggle,
            DeckAction::Next => TransportCommand::Next,
            DeckAction::Prev => TransportCommand::Previous,
            DeckAction::Shuffle => TransportCommand::Shuffle,
            DeckAction::Repeat => TransportCommand::Repeat,
            DeckAction::VolumeUp => TransportCommand::VolumeUp,
            DeckAction::VolumeDown => TransportCommand::VolumeDown,
            DeckAction::Share => return None,
        };
        Some(cmd)
    }

    /// Shuffle and repeat are toggles relative to the player's current mode.
    pub fn needs_snapshot(&self) -> bool {
        matches!(self, TransportCommand::Shuffle | TransportCommand::Repeat)
    }

    /// Endpoint and JSON body for this command.  `snapshot` is the player
    /// state for commands that need it.
    pub fn request(&self, snapshot: Option<&Value>) -> (&'static str, Option<Value>) {
        match self {
            TransportCommand::Toggle => ("toggle", None),
            TransportCommand::Next => ("next", None),
            TransportCommand::Previous => ("previous", None),
            TransportCommand::VolumeUp => ("volume", Some(json!({ "volume": "+5" }))),
            TransportCommand::VolumeDown => ("volume", Some(json!({ "volume": "-5" }))),
            TransportCommand::Shuffle => {
                let shuffle = snapshot
                    .and_then(|s| s.get("shuffle"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                ("setShuffleMode", Some(json!({ "shuffle": !shuffle })))
            }
            TransportCommand::Repeat => {
                let mode = snapshot
                    .and_then(|s| s.get("repeatMode"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                ("setRepeatMode", Some(json!({ "mode": (mode + 1) % 3 })))
            }
        }
    }
}

#[derive(Clone)]
pub struct TransportClient {
    client: reqwest::Client,
    base_url: String,
    host_tx: mpsc::Sender<HostMessage>,
}

impl TransportClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        host_tx: mpsc::Sender<HostMessage>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            host_tx,
        }
    }

    /// Full player state snapshot (`GET /`).
    pub async fn fetch_state(&self) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BridgeError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn post(&self, endpoint: &str, body: Option<Value>) -> Result<reqwest::StatusCode> {
        let mut request = self
            .client
            .post(format!("{}/{}", self.base_url, endpoint))
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(&body)?);
        }
        let response = request.send().await?;
        Ok(response.status())
    }

    /// Run one command on behalf of `context` and report back to that
    /// button only.
    pub async fn execute(&self, cmd: TransportCommand, context: &str) {
        let snapshot = if cmd.needs_snapshot() {
            match self.fetch_state().await {
                Ok(state) => Some(state),
                Err(e) => {
                    // Without the current mode there is nothing sensible to send
                    debug!("transport: {:?} skipped, no player state: {}", cmd, e);
                    return;
                }
            }
        } else {
            None
        };

        let (endpoint, body) = cmd.request(snapshot.as_ref());
        let feedback = match self.post(endpoint, body).await {
            Ok(status) if status == reqwest::StatusCode::OK => {
                info!("transport: {} ok", endpoint);
                Some(HostMessage::show_ok(context))
            }
            Ok(status) => {
                debug!("transport: {} returned {}", endpoint, status);
                None
            }
            Err(e) => {
                warn!("transport: {} failed: {}", endpoint, e);
                Some(HostMessage::show_alert(context))
            }
        };

        if let Some(msg) = feedback {
            let _ = self.host_tx.send(msg).await;
        }
    }

    pub fn spawn_execute(&self, cmd: TransportCommand, context: &str) {
        let client = self.clone();
        let context = context.to_string();
        tokio::spawn(async move {
            client.execute(cmd, &context).await;
        });
    }

    /// Fetch the player state for a newly visible button and hand it to the
    /// engine; `None` when the player is unreachable.
    pub fn spawn_snapshot(&self, event_tx: mpsc::Sender<EngineEvent>) {
        let client = self.clone();
        tokio::spawn(async move {
            let snapshot = match client.fetch_state().await {
                Ok(state) => Some(state),
                Err(e) => {
                    debug!("transport: state snapshot unavailable: {}", e);
                    None
                }
            };
            let _ = event_tx.send(EngineEvent::Snapshot(snapshot)).await;
        });
    }
}
