#![allow(dead_code)]

use std::time::Duration;

use deck_bridge::engine::{Engine, EngineEvent};
use deck_proto::config::Config;
use deck_proto::protocol::{HostEvent, HostMessage};
use tokio::sync::mpsc;

pub const ACTION_PLAYPAUSE: &str = "wtf.paul.tidal.playpause";
pub const ACTION_NEXT: &str = "wtf.paul.tidal.next";
pub const ACTION_SHARE: &str = "wtf.paul.tidal.share";

pub struct Harness {
    pub engine: Engine,
    pub host_rx: mpsc::Receiver<HostMessage>,
    pub event_rx: mpsc::Receiver<EngineEvent>,
}

/// Base URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}", addr)
}

/// Config whose HTTP endpoints all point at `base`.
pub fn config_for(base: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base.to_string();
    config.api.links_url = format!("{}/links", base);
    config
}

pub fn harness(config: &Config) -> Harness {
    let (event_tx, event_rx) = mpsc::channel(64);
    let (host_tx, host_rx) = mpsc::channel(256);
    let engine = Engine::new(config, host_tx, event_tx).expect("engine");
    Harness {
        engine,
        host_rx,
        event_rx,
    }
}

impl Harness {
    pub async fn appear(&mut self, action: &str, context: &str) {
        self.engine
            .handle_event(EngineEvent::Host(HostEvent::WillAppear {
                action: action.to_string(),
                context: context.to_string(),
            }))
            .await
            .expect("willAppear");
    }

    pub async fn feed(&mut self, raw: serde_json::Value) {
        self.engine
            .handle_event(EngineEvent::Feed(raw))
            .await
            .expect("feed");
    }

    /// Everything the engine has queued for the host so far.
    pub fn drain_host(&mut self) -> Vec<HostMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.host_rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Wait for the next background event matching `pred`, handing every
    /// skipped event to the engine first.
    pub async fn pump_until<F>(&mut self, mut pred: F) -> EngineEvent
    where
        F: FnMut(&EngineEvent) -> bool,
    {
        loop {
            let evt = tokio::time::timeout(Duration::from_secs(10), self.event_rx.recv())
                .await
                .expect("timed out waiting for engine event")
                .expect("event channel closed");
            if pred(&evt) {
                return evt;
            }
            self.engine.handle_event(evt).await.expect("pump");
        }
    }

    /// Wait for the next outbound host message matching `pred`.
    pub async fn host_until<F>(&mut self, mut pred: F) -> HostMessage
    where
        F: FnMut(&HostMessage) -> bool,
    {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(10), self.host_rx.recv())
                .await
                .expect("timed out waiting for host message")
                .expect("host channel closed");
            if pred(&msg) {
                return msg;
            }
        }
    }
}

pub fn count_images(msgs: &[HostMessage]) -> usize {
    msgs.iter()
        .filter(|m| matches!(m, HostMessage::SetImage { .. }))
        .count()
}

pub fn count_titles(msgs: &[HostMessage]) -> usize {
    msgs.iter()
        .filter(|m| matches!(m, HostMessage::SetTitle { .. }))
        .count()
}

pub fn state_targets(msgs: &[HostMessage]) -> Vec<(String, u8)> {
    msgs.iter()
        .filter_map(|m| match m {
            HostMessage::SetState { context, payload } => Some((context.clone(), payload.state)),
            _ => None,
        })
        .collect()
}
