//! Engine: single-owner event loop for the canonical playback state.
//!
//! Every input (feed messages, control-surface events, state snapshots and
//! enrichment completions) arrives as an `EngineEvent` on one mpsc channel.
//! The engine owns `PlaybackState` and the context `Registry` exclusively;
//! background tasks only post events back or write to the host socket.
//!
//! Each event is handled to completion, including render and fan-out,
//! before the next one is received, so renders never interleave.
use deck_proto::config::Config;
use deck_proto::protocol::{DeckAction, HostEvent, HostMessage};
use deck_proto::state::{PlaybackState, ShareOption};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::enrich::Enricher;
use crate::error::Result;
use crate::normalize::{normalize, FeedPayload, Outcome};
use crate::registry::{ContextRole, Dispatcher, Registry};
use crate::share::SharePresenter;
use crate::transport::{TransportClient, TransportCommand};

// ── EngineEvent ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum EngineEvent {
    /// Raw JSON message from the upstream feed.
    Feed(Value),
    /// Event from the control-surface host.
    Host(HostEvent),
    /// Player state fetched for a newly visible button (`None` = unreachable).
    Snapshot(Option<Value>),
    CoverFetched {
        generation: u64,
        result: Result<Vec<u8>>,
    },
    LinksResolved {
        generation: u64,
        result: Result<Vec<ShareOption>>,
    },
    /// Host socket closed; nothing left to drive.
    Shutdown,
}

// ── Engine ────────────────────────────────────────────────────────────────────

pub struct Engine {
    state: PlaybackState,
    registry: Registry,
    dispatcher: Dispatcher,
    enricher: Enricher,
    transport: TransportClient,
    share: SharePresenter,
    event_tx: mpsc::Sender<EngineEvent>,
    /// Bumped for every cover request; older completions are stale.
    cover_generation: u64,
    /// Bumped for every track URL change; older completions are stale.
    link_generation: u64,
    /// A visible change is waiting for the pending cover fetch.
    render_deferred: bool,
}

impl Engine {
    pub fn new(
        config: &Config,
        host_tx: mpsc::Sender<HostMessage>,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tidal-deck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            state: PlaybackState::default(),
            registry: Registry::new(),
            enricher: Enricher::new(client.clone(), &config.api, event_tx.clone())?,
            transport: TransportClient::new(client, &config.api.base_url, host_tx.clone()),
            share: SharePresenter::from_config(&config.share),
            dispatcher: Dispatcher::new(host_tx),
            event_tx,
            cover_generation: 0,
            link_generation: 0,
            render_deferred: false,
        })
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn render_count(&self) -> u64 {
        self.dispatcher.render_count()
    }

    pub fn cover_generation(&self) -> u64 {
        self.cover_generation
    }

    /// Run until `Shutdown` arrives or every sender is gone.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<EngineEvent>) {
        info!("Engine: starting event loop");

        while let Some(evt) = event_rx.recv().await {
            if matches!(evt, EngineEvent::Shutdown) {
                info!("Engine: shutdown requested");
                break;
            }
            if let Err(e) = self.handle_event(evt).await {
                error!("Engine: event error: {}", e);
            }
        }

        info!("Engine: event loop finished");
    }

    pub async fn handle_event(&mut self, evt: EngineEvent) -> Result<()> {
        match evt {
            EngineEvent::Feed(raw) => self.handle_feed(&raw).await,
            EngineEvent::Host(host) => self.handle_host(host).await,
            EngineEvent::Snapshot(snapshot) => self.handle_snapshot(snapshot).await,
            EngineEvent::CoverFetched { generation, result } => {
                self.handle_cover(generation, result).await
            }
            EngineEvent::LinksResolved { generation, result } => {
                self.handle_links(generation, result);
                Ok(())
            }
            EngineEvent::Shutdown => Ok(()),
        }
    }

    // ── feed ──────────────────────────────────────────────────────────────────

    async fn handle_feed(&mut self, raw: &Value) -> Result<()> {
        let Some(outcome) = self.apply(raw) else {
            return Ok(());
        };
        self.dispatch(outcome).await
    }

    fn apply(&mut self, raw: &Value) -> Option<Outcome> {
        let Some(payload) = FeedPayload::classify(raw) else {
            debug!("feed: ignoring non-object payload");
            return None;
        };
        Some(normalize(&mut self.state, &payload))
    }

    /// Turn a normalizer outcome into enrichment requests and host messages.
    async fn dispatch(&mut self, outcome: Outcome) -> Result<()> {
        if let Some(url) = &outcome.resolve_links {
            self.link_generation += 1;
            debug!("links: track changed to {} (gen {})", url, self.link_generation);
            self.enricher
                .spawn_link_resolution(url, self.link_generation);
        }

        if let Some(playing) = outcome.play_state {
            self.dispatcher
                .broadcast_toggle(&self.registry, playing)
                .await?;
        }

        // Only a started fetch takes a generation, so every newer generation
        // has a completion on its way that will flush a deferred render.
        let cover_pending = match &outcome.cover_url {
            Some(url) => {
                let next = self.cover_generation + 1;
                let started = self.enricher.spawn_cover_fetch(url, next);
                if started {
                    self.cover_generation = next;
                }
                started
            }
            None => false,
        };

        if outcome.changed {
            if cover_pending {
                self.render_deferred = true;
            } else {
                self.render().await?;
            }
        }
        Ok(())
    }

    async fn render(&mut self) -> Result<()> {
        self.render_deferred = false;
        self.dispatcher
            .broadcast_render(&self.state, &self.registry)
            .await
    }

    // ── enrichment completions ───────────────────────────────────────────────

    async fn handle_cover(&mut self, generation: u64, result: Result<Vec<u8>>) -> Result<()> {
        if generation != self.cover_generation {
            debug!(
                "cover: dropping stale result (gen {}, current {})",
                generation, self.cover_generation
            );
            return Ok(());
        }

        match result {
            Ok(bytes) if !bytes.is_empty() => {
                debug!("cover: {} bytes", bytes.len());
                self.state.cover_art = Some(bytes);
                self.render().await
            }
            Ok(_) => {
                debug!("cover: empty body, keeping previous art");
                self.flush_deferred().await
            }
            Err(e) => {
                debug!("cover: fetch failed, keeping previous art: {}", e);
                self.flush_deferred().await
            }
        }
    }

    async fn flush_deferred(&mut self) -> Result<()> {
        if self.render_deferred {
            self.render().await?;
        }
        Ok(())
    }

    fn handle_links(&mut self, generation: u64, result: Result<Vec<ShareOption>>) {
        if generation != self.link_generation {
            debug!(
                "links: dropping stale result (gen {}, current {})",
                generation, self.link_generation
            );
            return;
        }

        match result {
            Ok(options) => {
                debug!("links: {} share options", options.len());
                self.state.set_share_options(options);
            }
            Err(e) => {
                debug!("links: resolution failed: {}", e);
                self.state.share_options = None;
            }
        }
    }

    // ── snapshot ──────────────────────────────────────────────────────────────

    /// Seed freshly visible buttons.  Always renders so new buttons never wait
    /// for the next feed event.
    async fn handle_snapshot(&mut self, snapshot: Option<Value>) -> Result<()> {
        if let Some(raw) = snapshot {
            if let Some(mut outcome) = self.apply(&raw) {
                // Rendered below regardless of the cover fetch
                outcome.changed = false;
                self.dispatch(outcome).await?;
            }
        }
        self.render().await?;
        // New toggle buttons start at state 0 on the host side
        self.dispatcher
            .broadcast_toggle(&self.registry, self.state.is_playing)
            .await
    }

    // ── control surface ───────────────────────────────────────────────────────

    async fn handle_host(&mut self, evt: HostEvent) -> Result<()> {
        match evt {
            HostEvent::WillAppear { action, context } => {
                let role = match DeckAction::from_id(&action) {
                    Some(a) if a.is_toggle() => ContextRole::PlayPauseToggle,
                    _ => ContextRole::Generic,
                };
                debug!("host: {} appeared as {:?}", context, role);
                self.registry.register(&context, role);
                self.transport.spawn_snapshot(self.event_tx.clone());
                Ok(())
            }
            HostEvent::WillDisappear { context, .. } => {
                debug!("host: {} disappeared", context);
                self.registry.unregister(&context);
                Ok(())
            }
            HostEvent::KeyDown { action, context } => self.handle_key(&action, &context).await,
            HostEvent::Other => Ok(()),
        }
    }

    async fn handle_key(&mut self, action: &str, context: &str) -> Result<()> {
        let Some(action) = DeckAction::from_id(action) else {
            debug!("host: ignoring key for unknown action {}", action);
            return Ok(());
        };

        if let Some(cmd) = TransportCommand::from_action(action) {
            self.transport.spawn_execute(cmd, context);
            return Ok(());
        }

        // Share key
        if self.state.share_options.is_none() {
            debug!("share: no links available");
            return self.dispatcher.send(HostMessage::show_alert(context)).await;
        }
        if !self.share.is_configured() {
            warn!("share: no presenter configured");
            return self.dispatcher.send(HostMessage::show_alert(context)).await;
        }
        match self.share.present(&self.state) {
            Ok(true) => Ok(()),
            Ok(false) => self.dispatcher.send(HostMessage::show_alert(context)).await,
            Err(e) => {
                warn!("share: presenter failed: {}", e);
                self.dispatcher.send(HostMessage::show_alert(context)).await
            }
        }
    }
}
